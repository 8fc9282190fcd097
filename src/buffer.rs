//! The buffer pool: a bounded in-memory cache of disk pages.
//!
//! All page traffic between access methods and durable storage goes through
//! here. A pool owns a fixed set of frames, maps resident page ids to
//! frames, pins pages that callers are using, and evicts the least recently
//! released page when it needs room.
//!
//! # Architecture
//!
//! ```text
//! +---------------------------+
//! |    ParallelBufferPool     |   page_id % N routing,
//! +---------------------------+   round-robin allocation
//!    |        |           |
//!    v        v           v
//! +------+ +------+   +------+
//! | inst | | inst |...| inst |     each: page table, free list,
//! +------+ +------+   +------+     frame array, LruReplacer
//!    |        |           |
//!    v        v           v
//! +---------------------------+
//! |    DiskManager (shared)   |
//! +---------------------------+
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ballast::buffer::{BufferPool, BufferPoolConfig, ParallelBufferPool};
//! use ballast::disk::MemoryDiskManager;
//!
//! let disk = Arc::new(MemoryDiskManager::new());
//! let pool = ParallelBufferPool::new(disk, None, BufferPoolConfig::default());
//!
//! let frame = pool.new_page().unwrap();
//! let page_id = frame.page_id();
//! frame.data_mut()[..5].copy_from_slice(b"hello");
//! drop(frame);
//! pool.unpin_page(page_id, true);
//!
//! let frame = pool.fetch_page(page_id).unwrap();
//! assert_eq!(&frame.data()[..5], b"hello");
//! drop(frame);
//! pool.unpin_page(page_id, false);
//! ```

mod error;
mod frame;
mod guard;
mod instance;
mod parallel;
mod pool;
mod replacer;

pub use error::BufferPoolError;
pub use frame::FrameId;
pub use guard::{FrameRef, PageRead, PageWrite};
pub use instance::BufferPoolInstance;
pub use parallel::ParallelBufferPool;
pub use pool::{BufferPool, BufferPoolConfig};
pub use replacer::{LruReplacer, Replacer};
