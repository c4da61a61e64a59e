//! Store configuration.

/// How a range of order values is shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftMode {
    /// One single-row write per record, in anti-collision order.
    #[default]
    RowByRow,
    /// All new values staged and written as one multi-record write.
    Ranged,
}

/// How concurrent write transactions are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// One write transaction at a time; `begin_write` blocks until the
    /// previous writer commits or aborts.
    #[default]
    SingleWriter,
    /// Writers run concurrently on snapshots; a commit fails with
    /// `TransactionConflict` if a collection it touched changed since
    /// its snapshot.
    Optimistic,
}

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to sync the journal on every commit (safer but slower).
    pub sync_on_commit: bool,

    /// Strategy used by the range shift and compaction executors.
    pub shift_mode: ShiftMode,

    /// Serialization of concurrent write transactions.
    pub concurrency: ConcurrencyMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
            shift_mode: ShiftMode::RowByRow,
            concurrency: ConcurrencyMode::SingleWriter,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync the journal on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets the shift strategy.
    #[must_use]
    pub const fn shift_mode(mut self, mode: ShiftMode) -> Self {
        self.shift_mode = mode;
        self
    }

    /// Sets the concurrency mode.
    #[must_use]
    pub const fn concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency = mode;
        self
    }
}
