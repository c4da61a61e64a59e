//! The journal backend trait.

use crate::error::StorageResult;

/// An append-only byte log that backs a commit journal.
///
/// # Invariants
///
/// - `append` returns the offset the bytes were written at
/// - `read_at` returns exactly the bytes previously appended there
/// - after `sync` returns, everything appended so far survives a crash
/// - `replace` swaps the whole content in one step: a reader either sees
///   the old bytes or the new bytes, never a mix
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadPastEnd`] if the range is not
    /// fully inside the log, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends bytes to the end of the log and returns their offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current length of the log in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Forces data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Cuts the log back to `new_size` bytes.
    ///
    /// Used to drop a torn trailing frame after a crash.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is larger than the log or the
    /// truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Atomically replaces the whole log with `data`.
    ///
    /// Used when the journal is checkpointed into a single entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the replacement cannot be written or made
    /// durable. Either the previous or the new content is in place
    /// afterwards, and later appends extend whichever one it is.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;
}
