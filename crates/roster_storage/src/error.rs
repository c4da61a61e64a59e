//! Error types for journal storage.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by a [`crate::StorageBackend`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read reached past the end of the log.
    #[error("read beyond end of journal: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: usize,
        /// Current log size.
        size: u64,
    },

    /// Truncation to a size larger than the log.
    #[error("cannot truncate journal to {requested} bytes, it holds {size}")]
    TruncateBeyondEnd {
        /// Requested size.
        requested: u64,
        /// Current log size.
        size: u64,
    },

    /// The backing device is refusing writes.
    #[error("journal storage unavailable")]
    Unavailable,
}
