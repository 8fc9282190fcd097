//! Eviction policies over buffer pool frames.

use parking_lot::Mutex;

use super::frame::FrameId;

/// Selects which unpinned frame a pool should reclaim next.
///
/// The replacer tracks the set of frames currently eligible for eviction.
/// A frame enters the set when its pin count drops to zero and leaves it
/// when it is re-pinned or chosen as a victim.
///
/// Implementations lock internally; callers never wrap a replacer in their
/// own mutex.
pub trait Replacer: Send + Sync {
    /// Removes and returns the eviction-preferred frame, or `None` when no
    /// frame is eligible.
    fn victim(&self) -> Option<FrameId>;

    /// Removes `frame_id` from the eligible set. No-op if it is absent or
    /// out of range.
    fn pin(&self, frame_id: FrameId);

    /// Adds `frame_id` to the eligible set. No-op if it is already present
    /// or out of range; in particular, re-unpinning an eligible frame does
    /// not refresh its position.
    fn unpin(&self, frame_id: FrameId);

    /// Number of frames currently eligible for eviction.
    fn size(&self) -> usize;
}

/// LRU eviction: the victim is the frame that has been eligible the longest.
///
/// Recency here means recency of *becoming* eligible. A frame that is
/// re-pinned and later unpinned moves to the young end; a redundant `unpin`
/// of an already-eligible frame leaves its position untouched, so frames
/// that stay continuously eligible age out in FIFO order.
///
/// The eligible set is a doubly linked list laid out over two index vectors
/// plus a presence bitmap, all sized to the frame capacity. Links are frame
/// ids, so every operation is O(1) and no heap allocation happens after
/// construction.
pub struct LruReplacer {
    inner: Mutex<LruList>,
}

struct LruList {
    head: Option<usize>,
    tail: Option<usize>,
    next: Vec<Option<usize>>,
    prev: Vec<Option<usize>>,
    present: Vec<bool>,
    len: usize,
}

impl LruReplacer {
    /// Creates a replacer able to track frames `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruList {
                head: None,
                tail: None,
                next: vec![None; capacity],
                prev: vec![None; capacity],
                present: vec![false; capacity],
                len: 0,
            }),
        }
    }
}

impl Replacer for LruReplacer {
    fn victim(&self) -> Option<FrameId> {
        let mut list = self.inner.lock();
        let oldest = list.head?;
        list.unlink(oldest);
        Some(FrameId::new(oldest))
    }

    fn pin(&self, frame_id: FrameId) {
        let id = frame_id.as_usize();
        let mut list = self.inner.lock();
        if id >= list.present.len() || !list.present[id] {
            return;
        }
        list.unlink(id);
    }

    fn unpin(&self, frame_id: FrameId) {
        let id = frame_id.as_usize();
        let mut list = self.inner.lock();
        if id >= list.present.len() || list.present[id] {
            return;
        }
        list.push_tail(id);
    }

    fn size(&self) -> usize {
        self.inner.lock().len
    }
}

impl LruList {
    /// Appends `id` at the young end. Caller guarantees `id` is absent.
    fn push_tail(&mut self, id: usize) {
        self.prev[id] = self.tail;
        self.next[id] = None;
        match self.tail {
            Some(tail) => self.next[tail] = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.present[id] = true;
        self.len += 1;
    }

    /// Detaches `id` from the list. Caller guarantees `id` is present.
    fn unlink(&mut self, id: usize) {
        match self.prev[id] {
            Some(prev) => self.next[prev] = self.next[id],
            None => self.head = self.next[id],
        }
        match self.next[id] {
            Some(next) => self.prev[next] = self.prev[id],
            None => self.tail = self.prev[id],
        }
        self.next[id] = None;
        self.prev[id] = None;
        self.present[id] = false;
        self.len -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: usize) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn new_replacer_is_empty() {
        let replacer = LruReplacer::new(8);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn victim_returns_oldest_first() {
        let replacer = LruReplacer::new(8);
        replacer.unpin(fid(0));
        replacer.unpin(fid(1));
        replacer.unpin(fid(2));

        assert_eq!(replacer.size(), 3);
        assert_eq!(replacer.victim(), Some(fid(0)));
        assert_eq!(replacer.victim(), Some(fid(1)));
        assert_eq!(replacer.victim(), Some(fid(2)));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn pin_removes_from_eligible_set() {
        let replacer = LruReplacer::new(8);
        replacer.unpin(fid(0));
        replacer.unpin(fid(1));
        replacer.unpin(fid(2));

        replacer.pin(fid(1));

        assert_eq!(replacer.size(), 2);
        assert_eq!(replacer.victim(), Some(fid(0)));
        assert_eq!(replacer.victim(), Some(fid(2)));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn pin_of_absent_frame_is_noop() {
        let replacer = LruReplacer::new(8);
        replacer.pin(fid(5));
        assert_eq!(replacer.size(), 0);

        replacer.unpin(fid(3));
        replacer.pin(fid(3));
        replacer.pin(fid(3));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn redundant_unpin_does_not_refresh_position() {
        let replacer = LruReplacer::new(8);
        replacer.unpin(fid(3));
        replacer.unpin(fid(1));
        replacer.unpin(fid(4));
        replacer.unpin(fid(1)); // already eligible; must keep its place

        assert_eq!(replacer.size(), 3);
        assert_eq!(replacer.victim(), Some(fid(3)));
        assert_eq!(replacer.victim(), Some(fid(4)));
        assert_eq!(replacer.victim(), Some(fid(1)));
    }

    #[test]
    fn repin_then_unpin_moves_to_young_end() {
        let replacer = LruReplacer::new(8);
        replacer.unpin(fid(0));
        replacer.unpin(fid(1));
        replacer.unpin(fid(2));

        replacer.pin(fid(0));
        replacer.unpin(fid(0));

        assert_eq!(replacer.victim(), Some(fid(1)));
        assert_eq!(replacer.victim(), Some(fid(2)));
        assert_eq!(replacer.victim(), Some(fid(0)));
    }

    #[test]
    fn unlinking_middle_preserves_neighbors() {
        let replacer = LruReplacer::new(8);
        for id in 0..5 {
            replacer.unpin(fid(id));
        }

        replacer.pin(fid(2));
        replacer.pin(fid(3));

        assert_eq!(replacer.victim(), Some(fid(0)));
        assert_eq!(replacer.victim(), Some(fid(1)));
        assert_eq!(replacer.victim(), Some(fid(4)));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn out_of_range_ids_are_ignored() {
        let replacer = LruReplacer::new(4);
        replacer.unpin(fid(100));
        replacer.pin(fid(100));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn full_capacity_cycle() {
        let capacity = 16;
        let replacer = LruReplacer::new(capacity);

        for id in 0..capacity {
            replacer.unpin(fid(id));
        }
        assert_eq!(replacer.size(), capacity);

        for id in 0..capacity {
            assert_eq!(replacer.victim(), Some(fid(id)));
        }
        assert_eq!(replacer.size(), 0);

        // The arena is reusable after draining.
        replacer.unpin(fid(7));
        assert_eq!(replacer.victim(), Some(fid(7)));
    }
}
