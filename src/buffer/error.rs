//! Buffer pool errors.

use thiserror::Error;

use crate::disk::DiskError;

/// Failures surfaced by buffer pool operations.
///
/// Soft outcomes (page not resident, over-unpin, delete of a pinned page)
/// are reported through the boolean results of the operations themselves;
/// only exhaustion and disk faults rise to an error.
#[derive(Debug, Error)]
pub enum BufferPoolError {
    /// Every frame is pinned: the free list is empty and the replacer has
    /// no victim to offer.
    #[error("buffer pool exhausted: all frames are pinned")]
    PoolExhausted,

    /// The disk manager failed; fatal for the operation, no retries.
    #[error(transparent)]
    Disk(#[from] DiskError),
}
