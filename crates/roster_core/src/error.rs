//! Error types for RosterDB core.

use crate::record::RecordId;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in RosterDB core operations.
///
/// Every error raised inside a mutation aborts its transaction before it
/// reaches the caller: an error always means "the operation did not
/// happen".
#[derive(Debug, Error)]
pub enum CoreError {
    /// The journal device failed. The request is lost, the store is not.
    #[error("store unavailable: {0}")]
    Storage(#[from] roster_storage::StorageError),

    /// I/O error outside the journal (directory, lock file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A journal entry could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// The journal contains a damaged frame.
    #[error("journal corruption at offset {offset}: {message}")]
    JournalCorruption {
        /// Byte offset of the damaged frame, or the entry index when the
        /// frame decoded but could not be replayed.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// The target record does not exist.
    #[error("record {id} not found in collection {collection}")]
    NotFound {
        /// Collection name.
        collection: String,
        /// The missing record.
        id: RecordId,
    },

    /// A unique field (or the order itself) would be shared by two records.
    #[error("unique constraint on {collection}.{field} violated by value {value}")]
    ConstraintViolation {
        /// Collection name.
        collection: String,
        /// Field that carries the constraint.
        field: String,
        /// The conflicting value.
        value: String,
    },

    /// Another transaction committed to the same collection first.
    #[error("transaction conflict on collection {collection}")]
    TransactionConflict {
        /// Collection name.
        collection: String,
    },

    /// No collection registered under this name.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Collection name.
        name: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Why the operation is invalid.
        message: String,
    },

    /// Another process holds the store directory.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// The store has been closed.
    #[error("store is closed")]
    StoreClosed,
}

impl CoreError {
    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a journal corruption error.
    pub fn journal_corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::JournalCorruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(collection: impl Into<String>, id: RecordId) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id,
        }
    }

    /// Creates a constraint violation error.
    pub fn constraint_violation(
        collection: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::ConstraintViolation {
            collection: collection.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a transaction conflict error.
    pub fn transaction_conflict(collection: impl Into<String>) -> Self {
        Self::TransactionConflict {
            collection: collection.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if retrying the same request may succeed.
    ///
    /// The engine never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict { .. })
    }

    /// Returns true if the store itself could not be reached.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(CoreError::transaction_conflict("models").is_retryable());
        assert!(!CoreError::not_found("models", RecordId::new()).is_retryable());
        assert!(!CoreError::constraint_violation("models", "slug", "ada").is_retryable());
    }

    #[test]
    fn storage_failures_are_unavailable() {
        let err = CoreError::from(roster_storage::StorageError::Unavailable);
        assert!(err.is_unavailable());
        assert_eq!(err.to_string(), "store unavailable: journal storage unavailable");
    }

    #[test]
    fn constraint_message_names_the_field() {
        let err = CoreError::constraint_violation("models", "slug", "ada");
        assert_eq!(
            err.to_string(),
            "unique constraint on models.slug violated by value ada"
        );
    }
}
