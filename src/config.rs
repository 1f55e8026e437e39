//! Configuration types for dirmill
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Parallel file scanner built on a bounded job queue
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirmill",
    version,
    about = "Parallel file scanner built on a bounded job queue",
    long_about = "Walks the given paths, feeds every regular file through a fixed-capacity\n\
                  job queue, and processes them on a pool of worker threads.\n\n\
                  The queue gives the scan backpressure: discovery blocks while the\n\
                  buffer is full, and shutdown drains every queued file before the\n\
                  workers stop.",
    after_help = "EXAMPLES:\n    \
        dirmill search TODO src/\n    \
        dirmill search 'fn main' . -n 8 --exclude target\n    \
        dirmill histogram /var/log -n 4 --queue-capacity 256\n    \
        dirmill histogram data.bin -q"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Print lines containing a fixed string, like grep -F
    Search {
        /// Fixed string to look for (not a regex)
        #[arg(value_name = "NEEDLE")]
        needle: String,

        /// Files or directories to scan
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Count set bits per bit position across every payload byte
    Histogram {
        /// Files or directories to scan
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        scan: ScanArgs,
    },
}

/// Flags shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct ScanArgs {
    /// Number of worker threads
    #[arg(short = 'n', long = "workers", default_value = "1", value_name = "NUM")]
    pub workers: usize,

    /// Job queue capacity (bounds memory and discovery lead)
    #[arg(long, default_value = "64", value_name = "NUM")]
    pub queue_capacity: usize,

    /// Maximum directory depth below each root (0 walks only the root itself)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Exclude paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Quiet mode - suppress the live display and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// What the workers do with each file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Print every line containing the fixed string
    Search { needle: String },

    /// Accumulate the set-bit histogram over payload bytes
    Histogram,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Selected scan mode
    pub mode: ScanMode,

    /// Root paths to walk
    pub paths: Vec<PathBuf>,

    /// Number of worker threads
    pub worker_count: usize,

    /// Job queue capacity
    pub queue_capacity: usize,

    /// Maximum traversal depth
    pub max_depth: Option<usize>,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Suppress live display and summary
    pub quiet: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl RunConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let (mode, paths, scan) = match args.command {
            Command::Search {
                needle,
                paths,
                scan,
            } => (ScanMode::Search { needle }, paths, scan),
            Command::Histogram { paths, scan } => (ScanMode::Histogram, paths, scan),
        };

        if paths.is_empty() {
            return Err(ConfigError::NoPaths);
        }

        if scan.workers == 0 || scan.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: scan.workers,
                max: MAX_WORKERS,
            });
        }

        // Capacity 1 is legal; the queue just serializes discovery and
        // processing one file at a time.
        if scan.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity {
                capacity: scan.queue_capacity,
            });
        }

        let exclude_patterns = scan
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            mode,
            paths,
            worker_count: scan.workers,
            queue_capacity: scan.queue_capacity,
            max_depth: scan.max_depth,
            exclude_patterns,
            quiet: scan.quiet,
            verbose: scan.verbose,
        })
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let text = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&text))
    }
}
