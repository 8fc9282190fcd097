//! Caller-facing handles to pinned pages.

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};

use super::frame::FrameId;
use super::instance::BufferPoolInstance;
use crate::disk::DiskManager;
use crate::page::{PageData, PageId};
use crate::wal::Lsn;

/// Shared view of a pinned page's bytes.
pub type PageRead<'a> = MappedRwLockReadGuard<'a, [u8]>;

/// Exclusive view of a pinned page's bytes.
pub type PageWrite<'a> = MappedRwLockWriteGuard<'a, [u8]>;

/// Handle to a page pinned in a buffer pool.
///
/// A `FrameRef` is returned by `fetch_page` and `new_page` and stands for
/// one pin. It stays usable until the caller releases that pin with
/// `unpin_page`; after the unpin the frame may be rebound to another page,
/// so the handle must be discarded.
///
/// Payload access goes through [`data`](FrameRef::data) /
/// [`data_mut`](FrameRef::data_mut), which lock only this frame. Writing
/// through `data_mut` does not mark the page dirty by itself; modification
/// is reported when the pin is released, via `unpin_page(id, true)`.
///
/// The metadata accessors and every pool operation take the instance latch.
/// Payload guards sit below the latch in the lock order, so drop them
/// before touching metadata, calling into the pool, or releasing the pin.
pub struct FrameRef<'a, D: DiskManager> {
    instance: &'a BufferPoolInstance<D>,
    frame_id: FrameId,
    page_id: PageId,
}

impl<'a, D: DiskManager> FrameRef<'a, D> {
    pub(super) fn new(
        instance: &'a BufferPoolInstance<D>,
        frame_id: FrameId,
        page_id: PageId,
    ) -> Self {
        Self {
            instance,
            frame_id,
            page_id,
        }
    }

    /// The page this handle is pinned to.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Current pin count of the underlying frame.
    pub fn pin_count(&self) -> u32 {
        self.instance.frame_meta(self.frame_id).pin_count
    }

    /// Whether the frame carries modifications not yet on disk.
    pub fn is_dirty(&self) -> bool {
        self.instance.frame_meta(self.frame_id).is_dirty
    }

    /// LSN of the page's latest logged modification.
    pub fn lsn(&self) -> Lsn {
        self.instance.frame_meta(self.frame_id).lsn
    }

    /// Records the LSN of a modification so write-back can force the WAL
    /// far enough first.
    pub fn set_lsn(&self, lsn: Lsn) {
        self.instance.set_frame_lsn(self.frame_id, lsn);
    }

    /// Locks the page bytes for reading.
    pub fn data(&self) -> PageRead<'_> {
        let guard = self.instance.frame_payload(self.frame_id).read();
        RwLockReadGuard::map(guard, PageData::as_slice)
    }

    /// Locks the page bytes for writing.
    pub fn data_mut(&self) -> PageWrite<'_> {
        let guard = self.instance.frame_payload(self.frame_id).write();
        RwLockWriteGuard::map(guard, PageData::as_mut_slice)
    }
}
