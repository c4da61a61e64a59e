//! Identifiers shared by the store, the journal and the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of one write transaction, unique for the life of the process.
///
/// Only shows up in logs; the journal records commits by sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Wraps a raw counter value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw counter value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Position of a commit in the journal.
///
/// `0` is the empty store. Each commit that changes at least one
/// collection takes the next value, and a collection remembers the
/// sequence that last wrote it so an optimistic transaction can tell
/// whether its snapshot went stale.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    /// Wraps a raw sequence value.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The sequence the following commit gets.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// True if a commit at `self` happened after a snapshot taken at `snapshot`.
    #[must_use]
    pub fn is_after(self, snapshot: Self) -> bool {
        self > snapshot
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}

/// Journaled handle of an ordered collection such as `models`.
///
/// Handed out in registration order starting at 1 and replayed from the
/// journal, so the same name maps to the same ID after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(u32);

impl CollectionId {
    /// Wraps a raw collection number.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw collection number.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// The ID the next registered collection gets, given the highest one in use.
    #[must_use]
    pub fn following(highest: Option<Self>) -> Self {
        Self(highest.map_or(1, |id| id.0 + 1))
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col:{}", self.0)
    }
}
