//! Disk manager errors.

use std::io;

use thiserror::Error;

/// Errors surfaced by a [`DiskManager`](super::DiskManager).
///
/// The buffer pool treats any of these as fatal for the failing operation
/// and propagates them unchanged; there are no retries at this layer.
#[derive(Debug, Error)]
pub enum DiskError {
    /// A read or write buffer was not exactly one page long.
    #[error("invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize {
        /// Required length (the page size).
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// The backing file does not have a whole number of pages.
    #[error("storage file is corrupted: {0}")]
    Corrupted(String),

    /// Underlying operating system I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
