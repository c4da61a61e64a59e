//! A journal device that tears writes, for failure tests.

use parking_lot::Mutex;
use roster_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
use std::io;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Faults {
    tear_next_append: bool,
    refuse_truncate: bool,
    /// Bytes that landed but were never reported in `size`.
    uncounted: u64,
}

/// Wraps an [`InMemoryBackend`] and, on request, writes half of the next
/// append before failing with `ENOSPC`, the way a full disk does.
///
/// Like a file backend that caches its length, `size` does not count the
/// torn bytes, and the next append still lands after them.
#[derive(Debug, Clone, Default)]
pub(crate) struct TornWrites {
    inner: InMemoryBackend,
    faults: Arc<Mutex<Faults>>,
}

impl TornWrites {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Journal bytes as they sit on the device.
    pub(crate) fn data(&self) -> Vec<u8> {
        self.inner.data()
    }

    pub(crate) fn tear_next_append(&self) {
        self.faults.lock().tear_next_append = true;
    }

    pub(crate) fn refuse_truncate(&self, refuse: bool) {
        self.faults.lock().refuse_truncate = refuse;
    }
}

impl StorageBackend for TornWrites {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let mut faults = self.faults.lock();
        let offset = self.inner.size()? - faults.uncounted;
        if faults.tear_next_append {
            faults.tear_next_append = false;
            let half = &data[..data.len() / 2];
            self.inner.append(half)?;
            faults.uncounted += half.len() as u64;
            return Err(StorageError::Io(io::Error::other(
                "no space left on device",
            )));
        }
        self.inner.append(data)?;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.inner.size()? - self.faults.lock().uncounted)
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut faults = self.faults.lock();
        if faults.refuse_truncate {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "journal is read-only",
            )));
        }
        let counted = self.inner.size()? - faults.uncounted;
        if new_size > counted {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size: counted,
            });
        }
        self.inner.truncate(new_size)?;
        faults.uncounted = 0;
        Ok(())
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        let mut faults = self.faults.lock();
        self.inner.replace(data)?;
        faults.uncounted = 0;
        Ok(())
    }
}
