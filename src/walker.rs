//! Traversal driver that feeds the job queue
//!
//! The walker is the queue's single producer. It walks every configured
//! root with an explicit directory stack, pushing one job per regular file
//! and blocking whenever the queue is full; that blocking push is the only
//! flow control between discovery and processing.
//!
//! Per-path problems (unreadable directory, broken link) are warned and
//! counted, never fatal. The interrupt flag is checked between entries, so
//! a Ctrl-C stops discovery quickly while jobs already queued still drain.

use crate::config::RunConfig;
use crate::queue::JobProducer;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace, warn};

/// Counters accumulated over one walk
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Files handed to the queue
    pub files_enqueued: u64,

    /// Paths skipped by filters (exclude patterns, depth limit, symlinked
    /// directories)
    pub skipped: u64,

    /// Paths that could not be read
    pub errors: u64,

    /// True when the walk stopped before visiting everything
    pub interrupted: bool,
}

/// Walks the configured roots and enqueues regular files
pub struct Walker<'a> {
    jobs: &'a JobProducer<PathBuf>,
    config: &'a RunConfig,
    interrupt: &'a AtomicBool,
    stats: WalkStats,
}

impl<'a> Walker<'a> {
    pub fn new(
        jobs: &'a JobProducer<PathBuf>,
        config: &'a RunConfig,
        interrupt: &'a AtomicBool,
    ) -> Self {
        Self {
            jobs,
            config,
            interrupt,
            stats: WalkStats::default(),
        }
    }

    /// Walk every root in order and return the final counters.
    ///
    /// The queue is left open; shutting it down after the walk is the
    /// caller's decision.
    pub fn run(mut self) -> WalkStats {
        for root in &self.config.paths {
            if self.check_interrupt() {
                break;
            }
            self.walk_root(root);
        }

        debug!(
            enqueued = self.stats.files_enqueued,
            skipped = self.stats.skipped,
            errors = self.stats.errors,
            interrupted = self.stats.interrupted,
            "Walk finished"
        );
        self.stats
    }

    fn check_interrupt(&mut self) -> bool {
        if self.interrupt.load(Ordering::Relaxed) {
            self.stats.interrupted = true;
        }
        self.stats.interrupted
    }

    fn walk_root(&mut self, root: &Path) {
        // Roots are resolved through symlinks, like paths named on a grep
        // command line.
        let meta = match fs::metadata(root) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %root.display(), error = %e, "Cannot read path");
                self.stats.errors += 1;
                return;
            }
        };

        if meta.is_file() {
            self.enqueue(root.to_path_buf());
            return;
        }
        if !meta.is_dir() {
            debug!(path = %root.display(), "Not a regular file or directory");
            self.stats.skipped += 1;
            return;
        }

        let mut pending = vec![(root.to_path_buf(), 0usize)];
        while let Some((dir, depth)) = pending.pop() {
            if self.check_interrupt() {
                return;
            }
            self.read_entries(&dir, depth, &mut pending);
        }
    }

    fn read_entries(&mut self, dir: &Path, depth: usize, pending: &mut Vec<(PathBuf, usize)>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Cannot read directory");
                self.stats.errors += 1;
                return;
            }
        };

        for entry in entries {
            if self.check_interrupt() {
                return;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Unreadable directory entry");
                    self.stats.errors += 1;
                    continue;
                }
            };
            let path = entry.path();

            if self.config.is_excluded(&path) {
                trace!(path = %path.display(), "Excluded");
                self.stats.skipped += 1;
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot stat entry");
                    self.stats.errors += 1;
                    continue;
                }
            };

            if file_type.is_dir() {
                let child_depth = depth + 1;
                if self.config.max_depth.is_some_and(|max| child_depth > max) {
                    trace!(path = %path.display(), "Beyond depth limit");
                    self.stats.skipped += 1;
                } else {
                    pending.push((path, child_depth));
                }
            } else if file_type.is_file() {
                self.enqueue(path);
            } else if file_type.is_symlink() {
                // Links to files are followed; a link to a directory is not
                // descended, which keeps the walk cycle-free.
                match fs::metadata(&path) {
                    Ok(target) if target.is_file() => self.enqueue(path),
                    Ok(target) if target.is_dir() => {
                        trace!(path = %path.display(), "Symlinked directory not followed");
                        self.stats.skipped += 1;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Broken link");
                        self.stats.errors += 1;
                    }
                }
            }
            // Sockets, pipes and devices are not payload.
        }
    }

    fn enqueue(&mut self, path: PathBuf) {
        trace!(path = %path.display(), "Enqueueing file");
        if self.jobs.push(path).is_err() {
            // Nothing can be delivered any more; treat like an interrupt.
            warn!("Job queue closed during traversal");
            self.stats.interrupted = true;
            return;
        }
        self.stats.files_enqueued += 1;
    }
}
