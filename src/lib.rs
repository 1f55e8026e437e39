//! dirmill - Parallel File Scanner with a Bounded Job Queue
//!
//! A tool that walks directory trees and feeds every regular file through a
//! pool of worker threads, with a fixed-capacity queue between discovery and
//! processing so memory stays flat no matter how large the tree is.
//!
//! # Features
//!
//! - **Bounded Job Queue**: A fixed-size ring buffer with blocking push and
//!   pop. Discovery stalls when workers fall behind instead of buffering
//!   unboundedly.
//!
//! - **Drain-to-Completion Shutdown**: Closing the queue waits for every
//!   queued file to be processed before workers are released, so no
//!   discovered work is ever dropped.
//!
//! - **Pluggable Processing**: Workers run any [`pool::FileProcessor`].
//!   Two are built in: substring search with grep-style output, and a
//!   per-bit-position byte histogram with a live display.
//!
//! - **Interruptible**: Ctrl-C stops discovery between files; everything
//!   already queued still drains before the summary prints.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Directory Traversal                          │
//! │              (main thread, depth/exclude filters)                │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               │ blocking push (backpressure)
//!                               ▼
//!                  ┌──────────────────────────┐
//!                  │     Bounded Job Queue    │
//!                  │  - fixed ring buffer     │
//!                  │  - drains on shutdown    │
//!                  └────────────┬─────────────┘
//!                               │ blocking pop
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Worker Threads                              │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       └────────────┴─────┬──────┴────────────────────┘          │
//! │                          ▼                                      │
//! │             ┌──────────────────────────┐                        │
//! │             │      FileProcessor       │                        │
//! │             │  search  │  histogram    │                        │
//! │             └──────────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Search a tree for a string, 8 workers
//! dirmill search "TODO" src/ -n 8
//!
//! # Bit histogram of everything under /var/log
//! dirmill histogram /var/log -n 4
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod histogram;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod search;
pub mod walker;

pub use config::{CliArgs, RunConfig, ScanMode};
pub use coordinator::{ScanCoordinator, ScanReport};
pub use error::{MillError, Result};
pub use queue::{Exhausted, JobConsumer, JobProducer, JobQueue, PushError};
