//! Error types for dirmill
//!
//! This module defines the error hierarchy covering:
//! - Configuration and CLI errors
//! - Job queue construction errors
//! - Worker thread errors
//! - I/O errors from file processing
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Control-flow signals (`PushError`, `Exhausted`) are not errors and live
//!   next to the queue in [`crate::queue`]
//! - Per-file processing failures are reported and skipped, never fatal

use thiserror::Error;

/// Top-level error type for the dirmill application
#[derive(Error, Debug)]
pub enum MillError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Queue construction errors
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (file operations, sink writes)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue capacity
    #[error("Invalid queue capacity {capacity}: must be at least 1")]
    InvalidQueueCapacity { capacity: usize },

    /// No paths given to scan
    #[error("No paths to scan")]
    NoPaths,

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },
}

/// Job queue construction errors
#[derive(Error, Debug)]
pub enum QueueError {
    /// Capacity must be a positive integer
    #[error("Queue capacity must be positive")]
    InvalidCapacity,

    /// The slot array could not be allocated
    #[error("Failed to allocate queue storage for {capacity} slots")]
    OutOfMemory { capacity: usize },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker thread could not be started
    #[error("Failed to start worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },

    /// Worker panicked during processing
    #[error("Worker {id} panicked")]
    Panicked { id: usize },
}

/// Result type alias for MillError
pub type Result<T> = std::result::Result<T, MillError>;
