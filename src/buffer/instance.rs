//! Single buffer pool instance.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::error::BufferPoolError;
use super::frame::{Frame, FrameId, FrameMeta};
use super::guard::FrameRef;
use super::pool::BufferPool;
use super::replacer::{LruReplacer, Replacer};
use crate::disk::DiskManager;
use crate::page::{PageData, PageId};
use crate::wal::{LogManager, Lsn};

/// One shard of the buffer pool: a fixed array of frames, a page table
/// mapping resident page ids to frames, a free list, and an LRU replacer.
///
/// # Concurrency
///
/// A single latch serializes every public operation of an instance: it
/// covers the page table, the free list, the frame metadata, and the calls
/// the instance makes into its replacer and disk manager. Disk I/O happens
/// while the latch is held; sharding across instances is what provides
/// parallelism. Payload bytes are outside the latch, behind per-frame
/// read/write locks, so callers work on pinned pages without blocking the
/// instance.
///
/// Lock order: instance latch, then the replacer's internal mutex, then a
/// frame payload lock, then the disk manager. Never the reverse.
///
/// # Frame states
///
/// Every frame is free (in the free list), pinned resident (in the page
/// table with a nonzero pin count), or unpinned resident (in the page table
/// and in the replacer). The operations below move frames between exactly
/// these states.
pub struct BufferPoolInstance<D: DiskManager> {
    disk: Arc<D>,
    log: Option<Arc<dyn LogManager>>,
    frames: Vec<Frame>,
    state: Mutex<InstanceState>,
    replacer: LruReplacer,
    pool_size: usize,
    num_instances: u32,
    instance_index: u32,
}

/// Mutable bookkeeping guarded by the instance latch.
struct InstanceState {
    /// Resident pages only: one entry per occupied frame.
    page_table: HashMap<PageId, FrameId>,
    /// Metadata for every frame, indexed by frame id.
    meta: Vec<FrameMeta>,
    /// Frames holding no page, reused in insertion order.
    free_list: VecDeque<FrameId>,
    /// Next page id this instance will hand out.
    next_page_id: u32,
}

impl<D: DiskManager> BufferPoolInstance<D> {
    /// Creates a standalone instance that owns the whole page id space.
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` is zero.
    pub fn new(disk: Arc<D>, log: Option<Arc<dyn LogManager>>, pool_size: usize) -> Self {
        Self::striped(disk, log, pool_size, 1, 0)
    }

    /// Creates instance `instance_index` of a group of `num_instances`.
    ///
    /// The instance allocates only page ids congruent to `instance_index`
    /// modulo `num_instances`, starting at `instance_index` itself.
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` or `num_instances` is zero, or if
    /// `instance_index` is out of range.
    pub fn striped(
        disk: Arc<D>,
        log: Option<Arc<dyn LogManager>>,
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
    ) -> Self {
        assert!(pool_size > 0, "pool_size must be positive");
        assert!(num_instances > 0, "num_instances must be positive");
        assert!(
            instance_index < num_instances,
            "instance_index {} out of range for {} instances",
            instance_index,
            num_instances
        );

        let frames: Vec<_> = (0..pool_size).map(|_| Frame::new()).collect();
        let meta: Vec<_> = (0..pool_size).map(|_| FrameMeta::new()).collect();
        let free_list: VecDeque<_> = (0..pool_size).map(FrameId::new).collect();

        Self {
            disk,
            log,
            frames,
            state: Mutex::new(InstanceState {
                page_table: HashMap::with_capacity(pool_size),
                meta,
                free_list,
                next_page_id: instance_index,
            }),
            replacer: LruReplacer::new(pool_size),
            pool_size,
            num_instances,
            instance_index,
        }
    }

    /// Number of pages currently resident in this instance.
    pub fn resident_pages(&self) -> usize {
        self.state.lock().page_table.len()
    }

    /// Number of frames currently holding no page.
    pub fn free_frames(&self) -> usize {
        self.state.lock().free_list.len()
    }

    pub(super) fn frame_payload(&self, frame_id: FrameId) -> &RwLock<PageData> {
        &self.frames[frame_id.as_usize()].data
    }

    pub(super) fn frame_meta(&self, frame_id: FrameId) -> FrameMeta {
        self.state.lock().meta[frame_id.as_usize()]
    }

    pub(super) fn set_frame_lsn(&self, frame_id: FrameId, lsn: Lsn) {
        self.state.lock().meta[frame_id.as_usize()].lsn = lsn;
    }

    /// Hands out the next page id of this instance's stripe.
    fn allocate_page(&self, state: &mut InstanceState) -> PageId {
        let id = state.next_page_id;
        state.next_page_id = state.next_page_id.wrapping_add(self.num_instances);
        debug_assert_eq!(id % self.num_instances, self.instance_index);
        PageId::new(id)
    }

    /// Hook for returning `page_id` to the allocator. Reclaiming ids needs
    /// an allocation bitmap that does not exist yet, so this records
    /// nothing.
    fn deallocate_page(&self, _page_id: PageId) {}

    /// Takes a frame to rebind: free list first, then the replacer. A
    /// victim's old page is written back if dirty and dropped from the page
    /// table. The returned frame is in neither the free list nor the
    /// replacer.
    fn reclaim_frame(&self, state: &mut InstanceState) -> Result<FrameId, BufferPoolError> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self
            .replacer
            .victim()
            .ok_or(BufferPoolError::PoolExhausted)?;

        let meta = state.meta[frame_id.as_usize()];
        let old_page_id = meta.page_id.expect("victim frame holds no page");

        if meta.is_dirty {
            trace!(page_id = %old_page_id, "writing back dirty victim");
            if let Err(e) = self.write_back(old_page_id, frame_id, meta.lsn) {
                // The eviction did not happen; put the frame back in the
                // eligible set so it is not stranded.
                self.replacer.unpin(frame_id);
                return Err(e);
            }
            state.meta[frame_id.as_usize()].is_dirty = false;
        }

        state.page_table.remove(&old_page_id);
        Ok(frame_id)
    }

    /// Forces the WAL up to `lsn`, then writes the frame's payload to disk.
    fn write_back(
        &self,
        page_id: PageId,
        frame_id: FrameId,
        lsn: Lsn,
    ) -> Result<(), BufferPoolError> {
        if let Some(log) = &self.log {
            log.flush_until(lsn);
        }
        let data = self.frames[frame_id.as_usize()].data.read();
        self.disk.write_page(page_id, data.as_slice())?;
        Ok(())
    }
}

impl<D: DiskManager> BufferPool<D> for BufferPoolInstance<D> {
    fn fetch_page(&self, page_id: PageId) -> Result<FrameRef<'_, D>, BufferPoolError> {
        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            state.meta[frame_id.as_usize()].pin_count += 1;
            self.replacer.pin(frame_id);
            return Ok(FrameRef::new(self, frame_id, page_id));
        }

        let frame_id = self.reclaim_frame(&mut state)?;

        let read_result = {
            let mut data = self.frames[frame_id.as_usize()].data.write();
            self.disk.read_page(page_id, data.as_mut_slice())
        };
        if let Err(e) = read_result {
            // The frame already left the free list or the replacer; park it
            // as free so it is not stranded.
            state.meta[frame_id.as_usize()].clear();
            state.free_list.push_back(frame_id);
            return Err(e.into());
        }

        state.meta[frame_id.as_usize()].rebind(page_id);
        state.page_table.insert(page_id, frame_id);
        // A frame from the free list or a fresh victim is already absent
        // from the replacer; this pin must be a no-op.
        self.replacer.pin(frame_id);

        Ok(FrameRef::new(self, frame_id, page_id))
    }

    fn new_page(&self) -> Result<FrameRef<'_, D>, BufferPoolError> {
        let mut state = self.state.lock();

        let frame_id = self.reclaim_frame(&mut state)?;
        let page_id = self.allocate_page(&mut state);

        self.frames[frame_id.as_usize()].data.write().zero();
        state.meta[frame_id.as_usize()].rebind(page_id);
        state.page_table.insert(page_id, frame_id);
        // No replacer call needed: the frame came from the free list or was
        // just evicted, so it is not in the eligible set.

        Ok(FrameRef::new(self, frame_id, page_id))
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };

        let meta = &mut state.meta[frame_id.as_usize()];
        if meta.pin_count == 0 {
            return false;
        }

        if is_dirty {
            meta.is_dirty = true;
        }
        meta.pin_count -= 1;

        if meta.pin_count == 0 {
            self.replacer.unpin(frame_id);
        }
        true
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        let mut state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(false);
        };

        let lsn = state.meta[frame_id.as_usize()].lsn;
        self.write_back(page_id, frame_id, lsn)?;
        state.meta[frame_id.as_usize()].is_dirty = false;
        Ok(true)
    }

    fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let mut state = self.state.lock();

        let resident: Vec<(PageId, FrameId)> =
            state.page_table.iter().map(|(&p, &f)| (p, f)).collect();
        for &(page_id, frame_id) in &resident {
            let lsn = state.meta[frame_id.as_usize()].lsn;
            self.write_back(page_id, frame_id, lsn)?;
            state.meta[frame_id.as_usize()].is_dirty = false;
        }

        self.disk.sync_all()?;
        debug!(pages = resident.len(), "flushed all resident pages");
        Ok(())
    }

    fn delete_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        let mut state = self.state.lock();

        self.deallocate_page(page_id);

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(true);
        };

        let meta = state.meta[frame_id.as_usize()];
        if meta.pin_count != 0 {
            return Ok(false);
        }

        if meta.is_dirty {
            self.write_back(page_id, frame_id, meta.lsn)?;
        }

        // The frame is unpinned and therefore sits in the eligible set;
        // pin extracts it before the frame becomes free.
        self.replacer.pin(frame_id);
        state.page_table.remove(&page_id);
        state.meta[frame_id.as_usize()].clear();
        self.frames[frame_id.as_usize()].data.write().zero();
        state.free_list.push_back(frame_id);
        Ok(true)
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }
}
