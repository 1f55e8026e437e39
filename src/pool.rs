//! Worker pool that drains the job queue
//!
//! Each worker:
//! - Pulls file paths from the shared job queue, blocking while it is empty
//! - Hands every path to the injected [`FileProcessor`]
//! - Records a failed file and keeps going; per-file errors never stop a scan
//! - Exits cleanly when the queue reports exhaustion
//!
//! Workers only consume. They never push jobs and never shut the queue down;
//! that is the traversal driver's side of the contract.

use crate::error::{MillError, WorkerError};
use crate::queue::{Exhausted, JobConsumer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Per-file work injected into the pool
///
/// Implementations must be shareable across worker threads; per-scan state
/// (search pattern, shared histogram) lives inside the processor, per-call
/// state stays on the worker's stack.
pub trait FileProcessor: Send + Sync + 'static {
    /// Process one file, returning the number of payload bytes examined.
    fn process(&self, path: &Path) -> Result<u64, MillError>;
}

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Files fully processed
    pub files_processed: AtomicU64,

    /// Payload bytes examined
    pub bytes_processed: AtomicU64,

    /// Files that failed and were skipped
    pub failures: AtomicU64,
}

impl WorkerStats {
    fn record_file(&self, bytes: u64) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_processed.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// A worker thread that processes queued files
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        jobs: JobConsumer<PathBuf>,
        processor: Arc<dyn FileProcessor>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("mill-{}", id))
            .spawn(move || worker_loop(id, jobs, processor, stats_clone))
            .map_err(|e| WorkerError::InitFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| WorkerError::Panicked { id: self.id })
        } else {
            Ok(())
        }
    }
}

/// Main worker loop: pop until the queue is exhausted
fn worker_loop(
    id: usize,
    jobs: JobConsumer<PathBuf>,
    processor: Arc<dyn FileProcessor>,
    stats: Arc<WorkerStats>,
) {
    debug!(worker = id, "Worker starting");

    loop {
        let path = match jobs.pop() {
            Ok(path) => path,
            // Queue shut down and drained; nothing more will ever arrive.
            Err(Exhausted) => break,
        };

        match processor.process(&path) {
            Ok(bytes) => {
                stats.record_file(bytes);
                trace!(worker = id, path = %path.display(), bytes, "File processed");
            }
            Err(e) => {
                stats.record_failure();
                warn!(worker = id, path = %path.display(), error = %e, "File skipped");
            }
        }
    }

    debug!(
        worker = id,
        files = stats.files_processed.load(Ordering::Relaxed),
        bytes = stats.bytes_processed.load(Ordering::Relaxed),
        failures = stats.failures.load(Ordering::Relaxed),
        "Worker finished"
    );
}

/// Totals aggregated across the pool after all workers have joined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolTotals {
    /// Files fully processed
    pub files_processed: u64,

    /// Payload bytes examined
    pub bytes_processed: u64,

    /// Files that failed and were skipped
    pub failures: u64,
}

/// The pool of worker threads draining one job queue
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Spawn `count` workers, all consuming from the same queue.
    ///
    /// A thread that fails to start is fatal; already-started workers are
    /// left to drain the queue and exit once the producer shuts it down.
    pub fn spawn(
        count: usize,
        jobs: &JobConsumer<PathBuf>,
        processor: Arc<dyn FileProcessor>,
    ) -> Result<Self, WorkerError> {
        let mut workers = Vec::with_capacity(count);
        for id in 0..count {
            workers.push(Worker::spawn(id, jobs.clone(), Arc::clone(&processor))?);
        }

        debug!(count = workers.len(), "Workers spawned");
        Ok(Self { workers })
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Join every worker and aggregate final statistics.
    ///
    /// Totals are read after the joins, so they are exact. A panicked worker
    /// surfaces as an error, but only after every thread has been joined.
    pub fn join(self) -> Result<PoolTotals, WorkerError> {
        let stats: Vec<Arc<WorkerStats>> = self
            .workers
            .iter()
            .map(|w| Arc::clone(&w.stats))
            .collect();

        let mut first_failure = None;
        for worker in self.workers {
            let id = worker.id();
            if let Err(e) = worker.join() {
                warn!(worker = id, error = %e, "Worker did not join cleanly");
                first_failure.get_or_insert(e);
            }
        }
        if let Some(e) = first_failure {
            return Err(e);
        }

        let mut totals = PoolTotals::default();
        for s in &stats {
            totals.files_processed += s.files_processed.load(Ordering::Relaxed);
            totals.bytes_processed += s.bytes_processed.load(Ordering::Relaxed);
            totals.failures += s.failures.load(Ordering::Relaxed);
        }

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::JobQueue;

    struct LengthProcessor;

    impl FileProcessor for LengthProcessor {
        fn process(&self, path: &Path) -> Result<u64, MillError> {
            if path.extension().is_some_and(|ext| ext == "bad") {
                return Err(MillError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "rigged to fail",
                )));
            }
            Ok(path.as_os_str().len() as u64)
        }
    }

    struct PanickingProcessor;

    impl FileProcessor for PanickingProcessor {
        fn process(&self, path: &Path) -> Result<u64, MillError> {
            if path.file_name().is_some_and(|name| name == "tripwire.txt") {
                panic!("rigged to panic");
            }
            Ok(1)
        }
    }

    #[test]
    fn test_worker_stats() {
        let stats = WorkerStats::default();

        stats.record_file(1024);
        stats.record_file(512);
        stats.record_failure();

        assert_eq!(stats.files_processed.load(Ordering::Relaxed), 2);
        assert_eq!(stats.bytes_processed.load(Ordering::Relaxed), 1536);
        assert_eq!(stats.failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_pool_drains_queue() {
        let (tx, rx) = JobQueue::bounded(4).unwrap();
        let pool = WorkerPool::spawn(3, &rx, Arc::new(LengthProcessor)).unwrap();
        assert_eq!(pool.worker_count(), 3);

        let mut expected_bytes = 0u64;
        for i in 0..100 {
            let path = PathBuf::from(format!("/tmp/file-{i}.txt"));
            expected_bytes += path.as_os_str().len() as u64;
            tx.push(path).unwrap();
        }
        tx.shutdown();

        let totals = pool.join().unwrap();
        assert_eq!(totals.files_processed, 100);
        assert_eq!(totals.bytes_processed, expected_bytes);
        assert_eq!(totals.failures, 0);
    }

    #[test]
    fn test_pool_surfaces_panicked_worker() {
        let (tx, rx) = JobQueue::bounded(4).unwrap();
        let pool = WorkerPool::spawn(3, &rx, Arc::new(PanickingProcessor)).unwrap();

        // One poisoned job in the middle; the surviving workers drain the rest.
        for i in 0..20 {
            tx.push(PathBuf::from(format!("/tmp/file-{i}.txt"))).unwrap();
        }
        tx.push(PathBuf::from("/tmp/tripwire.txt")).unwrap();
        for i in 20..40 {
            tx.push(PathBuf::from(format!("/tmp/file-{i}.txt"))).unwrap();
        }
        tx.shutdown();

        let err = pool.join().unwrap_err();
        assert!(matches!(err, WorkerError::Panicked { id } if id < 3));
        assert_eq!(rx.len(), 0);
        assert_eq!(rx.pop(), Err(Exhausted));
    }

    #[test]
    fn test_pool_counts_failures_and_continues() {
        let (tx, rx) = JobQueue::bounded(2).unwrap();
        let pool = WorkerPool::spawn(2, &rx, Arc::new(LengthProcessor)).unwrap();

        for i in 0..10 {
            let name = if i % 2 == 0 {
                format!("/tmp/file-{i}.txt")
            } else {
                format!("/tmp/file-{i}.bad")
            };
            tx.push(PathBuf::from(name)).unwrap();
        }
        tx.shutdown();

        let totals = pool.join().unwrap();
        assert_eq!(totals.files_processed, 5);
        assert_eq!(totals.failures, 5);
    }
}
