//! Frames: the in-memory slots that hold pages.

use parking_lot::RwLock;

use crate::page::{PageData, PageId};
use crate::wal::Lsn;

/// Index of a frame within one pool instance's frame array.
///
/// Distinct from [`PageId`]: a page id names durable content, a frame id
/// names a memory slot. Frame ids are only meaningful inside the instance
/// that issued them and range over `0..pool_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

impl FrameId {
    /// Creates a `FrameId` from an array index.
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the frame id as an array index.
    pub const fn as_usize(&self) -> usize {
        self.0
    }
}

/// One slot of the frame array.
///
/// Only the payload bytes live here; bookkeeping about what the frame holds
/// is kept in [`FrameMeta`] under the instance latch. Splitting the two lets
/// callers read or write a pinned page's bytes without serializing against
/// unrelated pool operations.
pub(super) struct Frame {
    /// Payload of whatever page is currently bound to this frame.
    pub(super) data: RwLock<PageData>,
}

impl Frame {
    pub(super) fn new() -> Self {
        Self {
            data: RwLock::new(PageData::new()),
        }
    }
}

/// Bookkeeping for one frame, guarded by the owning instance's latch.
///
/// A frame is in exactly one of three states:
/// - free: `page_id` is `None`, the frame id sits in the free list;
/// - pinned resident: `page_id` is `Some`, `pin_count > 0`, absent from the
///   replacer;
/// - unpinned resident: `page_id` is `Some`, `pin_count == 0`, present in
///   the replacer.
#[derive(Debug, Clone, Copy)]
pub(super) struct FrameMeta {
    /// Page currently bound to the frame, `None` while free.
    pub(super) page_id: Option<PageId>,
    /// Outstanding caller references; the frame is immovable while nonzero.
    pub(super) pin_count: u32,
    /// Set when a caller reports a modification, cleared on flush or rebind.
    pub(super) is_dirty: bool,
    /// LSN of the page's latest modification; the WAL is forced up to this
    /// point before any write-back.
    pub(super) lsn: Lsn,
}

impl FrameMeta {
    pub(super) fn new() -> Self {
        Self {
            page_id: None,
            pin_count: 0,
            is_dirty: false,
            lsn: 0,
        }
    }

    /// Binds the frame to `page_id` with a single initial pin.
    pub(super) fn rebind(&mut self, page_id: PageId) {
        self.page_id = Some(page_id);
        self.pin_count = 1;
        self.is_dirty = false;
        self.lsn = 0;
    }

    /// Returns the frame to the free state.
    pub(super) fn clear(&mut self) {
        self.page_id = None;
        self.pin_count = 0;
        self.is_dirty = false;
        self.lsn = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_meta_is_free() {
        let meta = FrameMeta::new();
        assert_eq!(meta.page_id, None);
        assert_eq!(meta.pin_count, 0);
        assert!(!meta.is_dirty);
    }

    #[test]
    fn rebind_sets_initial_pin() {
        let mut meta = FrameMeta::new();
        meta.is_dirty = true;
        meta.lsn = 99;

        meta.rebind(PageId::new(42));

        assert_eq!(meta.page_id, Some(PageId::new(42)));
        assert_eq!(meta.pin_count, 1);
        assert!(!meta.is_dirty);
        assert_eq!(meta.lsn, 0);
    }

    #[test]
    fn clear_returns_to_free_state() {
        let mut meta = FrameMeta::new();
        meta.rebind(PageId::new(1));
        meta.is_dirty = true;

        meta.clear();

        assert_eq!(meta.page_id, None);
        assert_eq!(meta.pin_count, 0);
        assert!(!meta.is_dirty);
    }
}
