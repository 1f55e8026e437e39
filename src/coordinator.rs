//! Scan coordinator - orchestrates the parallel file scan
//!
//! The coordinator is responsible for:
//! - Creating the job queue and worker pool
//! - Driving the traversal that feeds the queue
//! - The drain-to-completion shutdown ordering
//! - Final statistics
//!
//! The ordering in [`ScanCoordinator::run`] is the whole contract: workers
//! are spawned before the first push so a full queue can always make
//! progress, and the queue is shut down only after the walk ends, which
//! blocks until every queued file has been processed.

use crate::config::RunConfig;
use crate::error::Result;
use crate::pool::{FileProcessor, WorkerPool};
use crate::queue::JobQueue;
use crate::walker::Walker;
use chrono::Utc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Result of a completed scan
#[derive(Debug)]
pub struct ScanReport {
    /// Files the walk handed to the queue
    pub files_enqueued: u64,

    /// Files the pool fully processed
    pub files_processed: u64,

    /// Payload bytes examined
    pub bytes_processed: u64,

    /// Files that failed and were skipped by workers
    pub process_failures: u64,

    /// Paths the walk could not read
    pub walk_errors: u64,

    /// Paths skipped by filters
    pub skipped: u64,

    /// Time taken for the scan
    pub duration: Duration,

    /// Whether the scan completed (vs was interrupted)
    pub completed: bool,
}

impl ScanReport {
    /// Processed files per second over the whole scan
    pub fn files_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.files_processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Coordinates the parallel scan
pub struct ScanCoordinator {
    /// Configuration
    config: Arc<RunConfig>,

    /// Interrupt signal, stops discovery only
    interrupt: Arc<AtomicBool>,
}

impl ScanCoordinator {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config: Arc::new(config),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the interrupt flag (for signal handlers).
    ///
    /// Setting the flag stops discovery between files; jobs already queued
    /// still drain before the scan returns.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Run the scan to completion and aggregate the results.
    pub fn run(&self, processor: Arc<dyn FileProcessor>) -> Result<ScanReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            workers = self.config.worker_count,
            queue_capacity = self.config.queue_capacity,
            started = %started_at.to_rfc3339(),
            "Starting scan"
        );

        let (jobs_tx, jobs_rx) = JobQueue::bounded(self.config.queue_capacity)?;

        // Workers must exist before the first blocking push, or a full
        // queue could never make progress.
        let pool = WorkerPool::spawn(self.config.worker_count, &jobs_rx, processor)?;

        let walk = Walker::new(&jobs_tx, &self.config, &self.interrupt).run();

        // Stop admission and wait for the workers to drain every queued
        // job; the slot storage is released once the drain completes.
        jobs_tx.shutdown();

        let totals = pool.join()?;
        let duration = start.elapsed();

        info!(
            files = totals.files_processed,
            bytes = totals.bytes_processed,
            failures = totals.failures,
            walk_errors = walk.errors,
            duration_secs = duration.as_secs(),
            "Scan finished"
        );

        Ok(ScanReport {
            files_enqueued: walk.files_enqueued,
            files_processed: totals.files_processed,
            bytes_processed: totals.bytes_processed,
            process_failures: totals.failures,
            walk_errors: walk.errors,
            skipped: walk.skipped,
            duration,
            completed: !walk.interrupted,
        })
    }
}
