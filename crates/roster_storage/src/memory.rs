//! In-memory journal backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A journal backend held entirely in memory.
///
/// Clones share the same underlying log, so a test can keep one handle
/// while the store owns another, inspect what was journaled, or make the
/// device refuse writes with [`InMemoryBackend::set_unavailable`].
///
/// ```rust
/// use roster_storage::{InMemoryBackend, StorageBackend};
///
/// let probe = InMemoryBackend::new();
/// let mut journal = probe.clone();
/// journal.append(b"entry").unwrap();
/// assert_eq!(probe.size().unwrap(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Vec<u8>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend preloaded with journal bytes.
    ///
    /// Useful for recovery tests.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            unavailable: Arc::default(),
        }
    }

    /// Returns a copy of the journal bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Makes every subsequent write fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(len as u64);

        if end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[offset as usize..end as usize].to_vec())
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        self.ensure_available()?;
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.ensure_available()
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.ensure_available()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.ensure_available()?;
        let mut data = self.data.write();
        let size = data.len() as u64;
        if new_size > size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size,
            });
        }
        data.truncate(new_size as usize);
        Ok(())
    }

    fn replace(&mut self, bytes: &[u8]) -> StorageResult<()> {
        self.ensure_available()?;
        *self.data.write() = bytes.to_vec();
        Ok(())
    }
}
