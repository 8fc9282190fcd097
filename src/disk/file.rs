//! File-backed page storage.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{DiskError, DiskManager};
use crate::page::{PAGE_SIZE, PageId};

/// Disk manager over a single data file.
///
/// # File layout
///
/// ```text
/// +------------------+------------------+------------------+
/// | page 0           | page 1           | page 2           | ...
/// +------------------+------------------+------------------+
/// ^ offset 0         ^ offset 4096      ^ offset 8192
/// ```
///
/// A write beyond the current end of file extends it; the intervening pages
/// read back as zeros, so a striped id space needs no preallocation.
///
/// # Concurrency
///
/// The file handle sits behind a mutex so seek+read and seek+write pairs are
/// atomic with respect to each other.
///
/// NOTE: positioned reads/writes (pread/pwrite) would allow concurrent I/O at
/// distinct offsets, and Direct I/O would bypass the OS cache. Neither is
/// required at this layer.
pub struct FileDiskManager {
    path: PathBuf,
    file: Mutex<File>,
    /// Current file length in bytes, always a multiple of the page size.
    len: AtomicU64,
}

impl FileDiskManager {
    /// Opens or creates the data file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DiskError::Corrupted` if an existing file's size is not a
    /// whole number of pages.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DiskError> {
        let path = path.into();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let len = file.metadata()?.len();
        if len % PAGE_SIZE as u64 != 0 {
            return Err(DiskError::Corrupted(format!(
                "file size {} is not a multiple of page size {}",
                len, PAGE_SIZE
            )));
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
            len: AtomicU64::new(len),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages the file currently spans.
    pub fn page_count(&self) -> usize {
        (self.len.load(Ordering::Acquire) / PAGE_SIZE as u64) as usize
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), DiskError> {
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let offset = page_id.byte_offset();
        if offset >= self.len.load(Ordering::Acquire) {
            // Never written; the durable contents are all zeros.
            buf.fill(0);
            return Ok(());
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), DiskError> {
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let offset = page_id.byte_offset();
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;

        let end = offset + PAGE_SIZE as u64;
        self.len.fetch_max(end, Ordering::AcqRel);
        Ok(())
    }

    fn sync_all(&self) -> Result<(), DiskError> {
        let file = self.file.lock();
        file.sync_all()?;
        Ok(())
    }
}
