//! Sharded buffer pool over independent instances.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::error::BufferPoolError;
use super::guard::FrameRef;
use super::instance::BufferPoolInstance;
use super::pool::{BufferPool, BufferPoolConfig};
use crate::disk::DiskManager;
use crate::page::PageId;

/// A fixed group of [`BufferPoolInstance`]s presented as one logical pool.
///
/// Page id `p` always belongs to instance `p % num_instances`, so every
/// routed operation touches exactly one instance latch and operations on
/// pages of different shards run concurrently. Instances allocate ids from
/// their own stripe, which keeps the routing rule and the allocation rule
/// consistent.
///
/// `new_page` cannot be routed by id (there is no id yet); it sweeps the
/// instances round-robin from a cursor that advances by one on every call,
/// so allocation pressure spreads instead of piling onto one shard.
pub struct ParallelBufferPool<D: DiskManager> {
    instances: Vec<BufferPoolInstance<D>>,
    /// First instance the next `new_page` sweep will try.
    cursor: Mutex<usize>,
}

impl<D: DiskManager> ParallelBufferPool<D> {
    /// Creates `config.num_instances` instances of `config.pool_size`
    /// frames each, all sharing one disk manager and one optional log
    /// manager.
    ///
    /// # Panics
    ///
    /// Panics if either config field is zero.
    pub fn new(
        disk: Arc<D>,
        log: Option<Arc<dyn crate::wal::LogManager>>,
        config: BufferPoolConfig,
    ) -> Self {
        assert!(config.pool_size > 0, "pool_size must be positive");
        assert!(config.num_instances > 0, "num_instances must be positive");

        let num_instances = config.num_instances as u32;
        let instances = (0..config.num_instances)
            .map(|index| {
                BufferPoolInstance::striped(
                    Arc::clone(&disk),
                    log.clone(),
                    config.pool_size,
                    num_instances,
                    index as u32,
                )
            })
            .collect();

        Self {
            instances,
            cursor: Mutex::new(0),
        }
    }

    /// Number of instances the pool is sharded across.
    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// Total pages resident across all instances.
    pub fn resident_pages(&self) -> usize {
        self.instances.iter().map(|i| i.resident_pages()).sum()
    }

    /// The instance responsible for `page_id`.
    fn instance_for(&self, page_id: PageId) -> &BufferPoolInstance<D> {
        let index = page_id.as_u32() % self.instances.len() as u32;
        &self.instances[index as usize]
    }
}

impl<D: DiskManager> BufferPool<D> for ParallelBufferPool<D> {
    fn fetch_page(&self, page_id: PageId) -> Result<FrameRef<'_, D>, BufferPoolError> {
        self.instance_for(page_id).fetch_page(page_id)
    }

    fn new_page(&self) -> Result<FrameRef<'_, D>, BufferPoolError> {
        let mut cursor = self.cursor.lock();
        let start = *cursor;
        // The cursor moves by one whether or not the sweep succeeds, so a
        // saturated instance is not retried first on the next call.
        *cursor = (start + 1) % self.instances.len();

        for offset in 0..self.instances.len() {
            let index = (start + offset) % self.instances.len();
            match self.instances[index].new_page() {
                Ok(frame) => return Ok(frame),
                Err(BufferPoolError::PoolExhausted) => continue,
                Err(e) => return Err(e),
            }
        }

        debug!("new_page sweep found every instance exhausted");
        Err(BufferPoolError::PoolExhausted)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        self.instance_for(page_id).unpin_page(page_id, is_dirty)
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        self.instance_for(page_id).flush_page(page_id)
    }

    fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        for instance in &self.instances {
            instance.flush_all_pages()?;
        }
        Ok(())
    }

    fn delete_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        self.instance_for(page_id).delete_page(page_id)
    }

    fn pool_size(&self) -> usize {
        self.instances.len() * self.instances[0].pool_size()
    }
}
