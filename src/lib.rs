//! ballast: a sharded buffer pool manager for a disk-oriented storage
//! engine.
//!
//! The crate layers three components, leaves first: an LRU [`buffer::Replacer`]
//! over frame ids, a fully latched [`buffer::BufferPoolInstance`] that serves
//! fetch/new/unpin/flush/delete for its stripe of the page id space, and a
//! [`buffer::ParallelBufferPool`] that spreads contention across instances
//! while presenting one logical cache. Durable I/O is delegated to a
//! [`disk::DiskManager`]; dirty write-back honors the write-ahead rule
//! through [`wal::LogManager`].

pub mod buffer;
pub mod disk;
pub mod page;
pub mod wal;
