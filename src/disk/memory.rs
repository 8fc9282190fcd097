//! In-memory page storage.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{DiskError, DiskManager};
use crate::page::{PAGE_SIZE, PageData, PageId};

/// Heap-backed disk manager for tests and ephemeral embeddings.
///
/// Pages are kept in a map keyed by page id, so sparse striped id spaces
/// cost only the pages actually written. A read of an id with no entry
/// zero-fills the caller's buffer, matching the contract for never-written
/// pages.
pub struct MemoryDiskManager {
    pages: Mutex<HashMap<PageId, PageData>>,
}

impl MemoryDiskManager {
    /// Creates an empty in-memory disk manager.
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// Number of pages that have been written at least once.
    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }
}

impl Default for MemoryDiskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), DiskError> {
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let pages = self.pages.lock();
        match pages.get(&page_id) {
            Some(page) => buf.copy_from_slice(page.as_slice()),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), DiskError> {
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let mut pages = self.pages.lock();
        let page = pages.entry(page_id).or_default();
        page.as_mut_slice().copy_from_slice(buf);
        Ok(())
    }

    fn sync_all(&self) -> Result<(), DiskError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let disk = MemoryDiskManager::new();

        let mut out = vec![0u8; PAGE_SIZE];
        out[0] = 42;
        out[100] = 99;
        disk.write_page(PageId::new(7), &out).unwrap();

        let mut buf = vec![0u8; PAGE_SIZE];
        disk.read_page(PageId::new(7), &mut buf).unwrap();
        assert_eq!(buf[0], 42);
        assert_eq!(buf[100], 99);
    }

    #[test]
    fn unwritten_page_reads_as_zeros() {
        let disk = MemoryDiskManager::new();

        let mut buf = vec![0xFFu8; PAGE_SIZE];
        disk.read_page(PageId::new(999), &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
        assert_eq!(disk.page_count(), 0);
    }

    #[test]
    fn sparse_ids_are_independent() {
        let disk = MemoryDiskManager::new();

        // A striped instance writes ids far apart without writing the gaps.
        for id in [3u32, 7, 11] {
            let mut out = vec![0u8; PAGE_SIZE];
            out[0] = id as u8;
            disk.write_page(PageId::new(id), &out).unwrap();
        }

        assert_eq!(disk.page_count(), 3);
        for id in [3u32, 7, 11] {
            let mut buf = vec![0u8; PAGE_SIZE];
            disk.read_page(PageId::new(id), &mut buf).unwrap();
            assert_eq!(buf[0], id as u8);
        }
    }

    #[test]
    fn rejects_short_buffers() {
        let disk = MemoryDiskManager::new();

        let mut buf = vec![0u8; 100];
        assert!(matches!(
            disk.read_page(PageId::new(0), &mut buf),
            Err(DiskError::InvalidBufferSize { .. })
        ));
        assert!(matches!(
            disk.write_page(PageId::new(0), &buf),
            Err(DiskError::InvalidBufferSize { .. })
        ));
    }

    #[test]
    fn sync_all_is_a_no_op() {
        let disk = MemoryDiskManager::new();
        disk.sync_all().unwrap();
    }
}
