//! Store facade: open, recover, begin/commit/abort, snapshot reads.

use crate::config::{ConcurrencyMode, Config};
use crate::error::{CoreError, CoreResult};
use crate::record::{OrderedRecord, RecordId};
use crate::store::collection::{CollectionData, CollectionSpec};
use crate::store::dir::StoreDir;
use crate::store::journal::{Journal, JournalEntry, JournalOp};
use crate::store::transaction::WriteTransaction;
use crate::types::{CollectionId, SequenceNumber, TransactionId};
use parking_lot::{Mutex, RwLock};
use roster_storage::StorageBackend;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// An immutable committed version of the whole store.
///
/// Collections are shared between versions; a commit replaces only the
/// collections it changed.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommittedState {
    pub(crate) seq: SequenceNumber,
    collections: HashMap<CollectionId, Arc<CollectionData>>,
    names: HashMap<String, CollectionId>,
}

impl CommittedState {
    pub(crate) fn collection(&self, id: CollectionId) -> CoreResult<&Arc<CollectionData>> {
        self.collections.get(&id).ok_or_else(|| CoreError::CollectionNotFound {
            name: id.to_string(),
        })
    }

    fn next_collection_id(&self) -> CollectionId {
        CollectionId::following(self.collections.keys().max().copied())
    }

    fn register(&mut self, id: CollectionId, spec: CollectionSpec, seq: SequenceNumber) {
        self.names.insert(spec.name.clone(), id);
        self.collections
            .insert(id, Arc::new(CollectionData::new(spec, seq)));
    }

    /// Applies a journal entry during recovery. `index` is the entry's
    /// position in the journal, reported on corruption.
    fn replay(&mut self, entry: JournalEntry, index: u64) -> CoreResult<()> {
        let mut puts: HashMap<CollectionId, Vec<OrderedRecord>> = HashMap::new();
        let mut deletes: HashMap<CollectionId, Vec<RecordId>> = HashMap::new();

        for op in entry.ops {
            match op {
                JournalOp::RegisterCollection { id, spec } => {
                    self.register(id, spec, entry.sequence);
                }
                JournalOp::Put { collection, record } => {
                    puts.entry(collection).or_default().push(record);
                }
                JournalOp::Delete { collection, id } => {
                    deletes.entry(collection).or_default().push(id);
                }
            }
        }

        let mut changed: Vec<CollectionId> = puts.keys().chain(deletes.keys()).copied().collect();
        changed.sort_unstable();
        changed.dedup();

        for id in changed {
            let current = self.collections.get(&id).ok_or_else(|| {
                CoreError::journal_corruption(index, format!("write to unknown {id}"))
            })?;
            let mut data = CollectionData::clone(current);
            for record_id in deletes.remove(&id).unwrap_or_default() {
                data.delete(record_id);
            }
            data.put_many(puts.remove(&id).unwrap_or_default())
                .map_err(|e| CoreError::journal_corruption(index, e.to_string()))?;
            data.set_last_commit(entry.sequence);
            self.collections.insert(id, Arc::new(data));
        }

        self.seq = entry.sequence;
        Ok(())
    }

    /// A single entry that rebuilds this state from nothing.
    fn to_checkpoint(&self) -> JournalEntry {
        let mut ids: Vec<&CollectionId> = self.collections.keys().collect();
        ids.sort_unstable();

        let mut ops = Vec::new();
        for id in ids {
            let data = &self.collections[id];
            ops.push(JournalOp::RegisterCollection {
                id: *id,
                spec: data.spec().clone(),
            });
            ops.extend(data.iter_ordered().map(|record| JournalOp::Put {
                collection: *id,
                record: record.clone(),
            }));
        }

        JournalEntry {
            sequence: self.seq,
            ops,
        }
    }
}

/// The ordered store.
///
/// `Store` is the entry point for everything the engine persists:
/// - collection registration
/// - write transactions (`begin_write` / `commit` / `abort`)
/// - transaction-consistent reads of committed state
/// - journal recovery and checkpointing
///
/// ```rust
/// use roster_core::{CollectionSpec, OrderedRecord, OrderedTxn, Payload, RecordId, Store};
///
/// let store = Store::open_in_memory().unwrap();
/// let models = store.collection(CollectionSpec::new("models")).unwrap();
///
/// let mut txn = store.begin_write().unwrap();
/// txn.put(models, OrderedRecord::new(RecordId::new(), 1, Payload::new())).unwrap();
/// store.commit(&mut txn).unwrap();
///
/// assert_eq!(store.list(models).unwrap().len(), 1);
/// ```
pub struct Store {
    config: Config,
    dir: Option<StoreDir>,
    journal: Mutex<Journal>,
    committed: RwLock<Arc<CommittedState>>,
    next_txid: AtomicU64,
    write_lock: Mutex<()>,
    is_open: RwLock<bool>,
}

impl Store {
    /// Opens a store directory with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `StoreLocked` if another process holds the directory,
    /// `JournalCorruption` if the journal is damaged, or an I/O error.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a store directory with a custom configuration.
    ///
    /// # Errors
    ///
    /// See [`Store::open`].
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        use roster_storage::FileBackend;

        let dir = StoreDir::open(path, config.create_if_missing)?;
        let backend = FileBackend::open_with_create_dirs(&dir.journal_path())?;
        let store = Self::open_with_backend(config, Box::new(backend))?;

        info!(path = %path.display(), "opened store");
        Ok(Self {
            dir: Some(dir),
            ..store
        })
    }

    /// Opens a store over an already-configured journal backend.
    ///
    /// # Errors
    ///
    /// Returns `JournalCorruption` if the journal is damaged.
    pub fn open_with_backend(config: Config, backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let mut journal = Journal::new(backend, config.sync_on_commit);
        let state = Self::recover(&mut journal)?;

        Ok(Self {
            config,
            dir: None,
            journal: Mutex::new(journal),
            committed: RwLock::new(Arc::new(state)),
            next_txid: AtomicU64::new(1),
            write_lock: Mutex::new(()),
            is_open: RwLock::new(true),
        })
    }

    /// Opens an empty, non-persistent store.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other openers.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_in_memory_with_config(Config::default())
    }

    /// Opens an empty, non-persistent store with a custom configuration.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other openers.
    pub fn open_in_memory_with_config(config: Config) -> CoreResult<Self> {
        use roster_storage::InMemoryBackend;
        Self::open_with_backend(config, Box::new(InMemoryBackend::new()))
    }

    fn recover(journal: &mut Journal) -> CoreResult<CommittedState> {
        let entries = journal.read_all()?;
        let count = entries.len();
        let mut state = CommittedState::default();

        for (index, entry) in entries.into_iter().enumerate() {
            state.replay(entry, index as u64)?;
        }

        if count > 0 {
            info!(
                entries = count,
                committed_seq = state.seq.as_u64(),
                collections = state.collections.len(),
                "recovered store from journal"
            );
        }
        Ok(state)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the store directory, if this store is file-backed.
    #[must_use]
    pub fn dir(&self) -> Option<&StoreDir> {
        self.dir.as_ref()
    }

    /// Registers a collection, or returns the ID it already has.
    ///
    /// Registration is journaled as its own commit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the name is already registered with
    /// different unique fields.
    pub fn collection(&self, spec: CollectionSpec) -> CoreResult<CollectionId> {
        self.ensure_open()?;
        let mut journal = self.journal.lock();
        let current = Arc::clone(&self.committed.read());

        if let Some(&id) = current.names.get(&spec.name) {
            let existing = current.collection(id)?.spec();
            if existing.unique_fields != spec.unique_fields {
                return Err(CoreError::invalid_operation(format!(
                    "collection {} already registered with unique fields {:?}",
                    spec.name, existing.unique_fields
                )));
            }
            return Ok(id);
        }

        let id = current.next_collection_id();
        let seq = current.seq.next();
        journal.append(&JournalEntry {
            sequence: seq,
            ops: vec![JournalOp::RegisterCollection {
                id,
                spec: spec.clone(),
            }],
        })?;

        let mut next = CommittedState::clone(&current);
        next.register(id, spec, seq);
        next.seq = seq;
        *self.committed.write() = Arc::new(next);

        debug!(collection = %id, "registered collection");
        Ok(id)
    }

    /// Looks up a collection ID by name.
    #[must_use]
    pub fn collection_id(&self, name: &str) -> Option<CollectionId> {
        self.committed.read().names.get(name).copied()
    }

    /// Returns every registered collection, ordered by ID.
    #[must_use]
    pub fn collections(&self) -> Vec<(CollectionId, CollectionSpec)> {
        let state = self.snapshot();
        let mut all: Vec<(CollectionId, CollectionSpec)> = state
            .collections
            .iter()
            .map(|(id, data)| (*id, data.spec().clone()))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        all
    }

    /// Begins a write transaction.
    ///
    /// In single-writer mode this blocks until no other write transaction
    /// is active.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` if the store is closed.
    pub fn begin_write(&self) -> CoreResult<WriteTransaction<'_>> {
        self.ensure_open()?;
        let guard = match self.config.concurrency {
            ConcurrencyMode::SingleWriter => Some(self.write_lock.lock()),
            ConcurrencyMode::Optimistic => None,
        };
        let id = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        let base = self.snapshot();
        debug!(txn = %id, snapshot = %base.seq, "begin write transaction");
        Ok(WriteTransaction::new(id, base, guard))
    }

    /// Commits a write transaction.
    ///
    /// The transaction's changes are journaled, then published as the new
    /// committed state in one step. Returns the commit sequence, or the
    /// unchanged current sequence if the transaction wrote nothing.
    ///
    /// # Errors
    ///
    /// - `TransactionConflict` if a collection the transaction accessed
    ///   was committed to after its snapshot
    /// - a storage error if the journal write fails
    ///
    /// On error the transaction is aborted and nothing is published.
    pub fn commit(&self, txn: &mut WriteTransaction<'_>) -> CoreResult<SequenceNumber> {
        txn.ensure_active()?;
        if let Err(err) = self.ensure_open() {
            txn.mark_aborted();
            return Err(err);
        }

        let mut journal = self.journal.lock();
        let current = Arc::clone(&self.committed.read());

        let accessed: Vec<CollectionId> = txn.accessed_collections().collect();
        for collection in accessed {
            let stale = current.collection(collection).map(|data| {
                (
                    data.last_commit().is_after(txn.snapshot_seq()),
                    data.name().to_owned(),
                )
            });
            match stale {
                Ok((false, _)) => {}
                Ok((true, name)) => {
                    txn.mark_aborted();
                    return Err(CoreError::transaction_conflict(name));
                }
                Err(err) => {
                    txn.mark_aborted();
                    return Err(err);
                }
            }
        }

        if txn.is_empty() {
            txn.mark_committed();
            return Ok(current.seq);
        }

        let seq = current.seq.next();
        let entry = JournalEntry {
            sequence: seq,
            ops: txn.journal_ops(),
        };
        if let Err(err) = journal.append(&entry) {
            txn.mark_aborted();
            return Err(err);
        }

        let mut next = CommittedState::clone(&current);
        for (id, mut data) in txn.take_working() {
            data.set_last_commit(seq);
            next.collections.insert(id, Arc::new(data));
        }
        next.seq = seq;
        *self.committed.write() = Arc::new(next);
        txn.mark_committed();

        debug!(txn = %txn.id(), seq = %seq, changes = entry.ops.len(), "committed");
        Ok(seq)
    }

    /// Aborts a write transaction, discarding all of its writes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the transaction is not active.
    pub fn abort(&self, txn: &mut WriteTransaction<'_>) -> CoreResult<()> {
        txn.ensure_active()?;
        txn.mark_aborted();
        debug!(txn = %txn.id(), "aborted");
        Ok(())
    }

    /// Lists a collection in ascending order from the latest commit.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` or `StoreClosed`.
    pub fn list(&self, collection: CollectionId) -> CoreResult<Vec<OrderedRecord>> {
        self.ensure_open()?;
        let state = self.snapshot();
        let data = state.collection(collection)?;
        Ok(data.iter_ordered().cloned().collect())
    }

    /// Gets a record from the latest commit.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` or `StoreClosed`.
    pub fn get(&self, collection: CollectionId, id: RecordId) -> CoreResult<Option<OrderedRecord>> {
        self.ensure_open()?;
        let state = self.snapshot();
        Ok(state.collection(collection)?.get(id).cloned())
    }

    /// Number of records in a collection at the latest commit.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` or `StoreClosed`.
    pub fn count(&self, collection: CollectionId) -> CoreResult<usize> {
        self.ensure_open()?;
        Ok(self.snapshot().collection(collection)?.len())
    }

    /// Returns the latest committed sequence number.
    #[must_use]
    pub fn committed_seq(&self) -> SequenceNumber {
        self.committed.read().seq
    }

    /// Rewrites the journal as a single entry holding the current state.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the journal cannot be replaced or the
    /// replacement cannot be made durable. The old journal or the
    /// checkpoint is then in place, and both replay to the same state.
    pub fn checkpoint(&self) -> CoreResult<()> {
        self.ensure_open()?;
        let mut journal = self.journal.lock();
        let state = self.snapshot();
        let before = journal.size()?;
        journal.rewrite(&state.to_checkpoint())?;
        info!(
            seq = %state.seq,
            before_bytes = before,
            after_bytes = journal.size()?,
            "checkpointed journal"
        );
        Ok(())
    }

    /// Returns the journal length in bytes.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the size cannot be read.
    pub fn journal_size(&self) -> CoreResult<u64> {
        self.journal.lock().size()
    }

    /// Closes the store. Later operations fail with `StoreClosed`.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` if already closed.
    pub fn close(&self) -> CoreResult<()> {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return Err(CoreError::StoreClosed);
        }
        *is_open = false;
        Ok(())
    }

    /// Returns true if the store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::StoreClosed)
        }
    }

    fn snapshot(&self) -> Arc<CommittedState> {
        Arc::clone(&self.committed.read())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("committed_seq", &self.committed_seq())
            .field("collections", &self.committed.read().collections.len())
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Payload;
    use crate::store::faults::TornWrites;
    use crate::store::OrderedTxn;
    use roster_storage::InMemoryBackend;
    use serde_json::json;

    fn record(order: u32) -> OrderedRecord {
        OrderedRecord::new(RecordId::new(), order, Payload::new())
    }

    fn orders(store: &Store, collection: CollectionId) -> Vec<u32> {
        store.list(collection).unwrap().iter().map(|r| r.order).collect()
    }

    #[test]
    fn collection_registration_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let a = store.collection(CollectionSpec::new("models")).unwrap();
        let b = store.collection(CollectionSpec::new("models")).unwrap();
        let c = store.collection(CollectionSpec::new("sponsors")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.collection_id("sponsors"), Some(c));
        assert_eq!(store.collections().len(), 2);
    }

    #[test]
    fn conflicting_registration_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        store.collection(CollectionSpec::new("models")).unwrap();
        let result = store.collection(CollectionSpec::new("models").unique("slug"));
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn uncommitted_writes_are_invisible() {
        let store = Store::open_in_memory().unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();

        let mut txn = store.begin_write().unwrap();
        txn.put(models, record(1)).unwrap();
        assert_eq!(txn.max_order(models).unwrap(), 1);
        assert!(store.list(models).unwrap().is_empty());

        store.commit(&mut txn).unwrap();
        assert_eq!(orders(&store, models), vec![1]);
    }

    #[test]
    fn abort_discards_writes() {
        let store = Store::open_in_memory().unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();
        let seq = store.committed_seq();

        let mut txn = store.begin_write().unwrap();
        txn.put(models, record(1)).unwrap();
        store.abort(&mut txn).unwrap();

        assert!(store.list(models).unwrap().is_empty());
        assert_eq!(store.committed_seq(), seq);
        assert!(store.commit(&mut txn).is_err());
    }

    #[test]
    fn dropped_transaction_is_discarded_and_releases_lock() {
        let store = Store::open_in_memory().unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();

        {
            let mut txn = store.begin_write().unwrap();
            txn.put(models, record(1)).unwrap();
        }

        let mut txn = store.begin_write().unwrap();
        assert_eq!(txn.max_order(models).unwrap(), 0);
        store.abort(&mut txn).unwrap();
    }

    #[test]
    fn empty_commit_does_not_advance_sequence() {
        let store = Store::open_in_memory().unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();
        let seq = store.committed_seq();

        let mut txn = store.begin_write().unwrap();
        txn.max_order(models).unwrap();
        assert_eq!(store.commit(&mut txn).unwrap(), seq);
    }

    #[test]
    fn optimistic_conflict_aborts_the_later_commit() {
        let config = Config::new().concurrency(ConcurrencyMode::Optimistic);
        let store = Store::open_in_memory_with_config(config).unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();

        let mut first = store.begin_write().unwrap();
        let mut second = store.begin_write().unwrap();
        let top = first.max_order(models).unwrap();
        first.put(models, record(top + 1)).unwrap();
        let top = second.max_order(models).unwrap();
        second.put(models, record(top + 1)).unwrap();

        store.commit(&mut first).unwrap();
        let err = store.commit(&mut second).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(orders(&store, models), vec![1]);
    }

    #[test]
    fn optimistic_writers_on_different_collections_both_commit() {
        let config = Config::new().concurrency(ConcurrencyMode::Optimistic);
        let store = Store::open_in_memory_with_config(config).unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();
        let sponsors = store.collection(CollectionSpec::new("sponsors")).unwrap();

        let mut first = store.begin_write().unwrap();
        let mut second = store.begin_write().unwrap();
        first.put(models, record(1)).unwrap();
        second.put(sponsors, record(1)).unwrap();

        store.commit(&mut first).unwrap();
        store.commit(&mut second).unwrap();
        assert_eq!(orders(&store, models), vec![1]);
        assert_eq!(orders(&store, sponsors), vec![1]);
    }

    #[test]
    fn journal_failure_aborts_and_keeps_state() {
        let probe = InMemoryBackend::new();
        let store = Store::open_with_backend(Config::default(), Box::new(probe.clone())).unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();

        probe.set_unavailable(true);
        let mut txn = store.begin_write().unwrap();
        txn.put(models, record(1)).unwrap();
        let err = store.commit(&mut txn).unwrap_err();

        assert!(err.is_unavailable());
        assert!(!txn.is_active());
        assert!(store.list(models).unwrap().is_empty());
    }

    fn commit_one(store: &Store, models: CollectionId, order: u32) -> CoreResult<SequenceNumber> {
        let mut txn = store.begin_write()?;
        txn.put(models, record(order))?;
        store.commit(&mut txn)
    }

    #[test]
    fn commits_after_a_torn_write_survive_reopen() {
        let device = TornWrites::new();
        let store = Store::open_with_backend(Config::default(), Box::new(device.clone())).unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();
        commit_one(&store, models, 1).unwrap();

        device.tear_next_append();
        assert!(commit_one(&store, models, 2).is_err());
        commit_one(&store, models, 2).unwrap();
        drop(store);

        let reopened = Store::open_with_backend(
            Config::default(),
            Box::new(InMemoryBackend::with_data(device.data())),
        )
        .unwrap();
        assert_eq!(orders(&reopened, models), vec![1, 2]);
    }

    #[test]
    fn torn_write_that_cannot_be_cut_refuses_commits() {
        let device = TornWrites::new();
        let store = Store::open_with_backend(Config::default(), Box::new(device.clone())).unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();
        commit_one(&store, models, 1).unwrap();
        let seq = store.committed_seq();

        device.refuse_truncate(true);
        device.tear_next_append();
        assert!(commit_one(&store, models, 2).is_err());
        assert!(commit_one(&store, models, 2).unwrap_err().is_unavailable());
        assert_eq!(store.committed_seq(), seq);
        assert_eq!(orders(&store, models), vec![1]);

        device.refuse_truncate(false);
        commit_one(&store, models, 2).unwrap();
        drop(store);

        let reopened = Store::open_with_backend(
            Config::default(),
            Box::new(InMemoryBackend::with_data(device.data())),
        )
        .unwrap();
        assert_eq!(orders(&reopened, models), vec![1, 2]);
    }

    #[test]
    fn state_is_recovered_from_journal() {
        let probe = InMemoryBackend::new();
        let (models, kept) = {
            let store =
                Store::open_with_backend(Config::default(), Box::new(probe.clone())).unwrap();
            let models = store
                .collection(CollectionSpec::new("models").unique("slug"))
                .unwrap();
            let mut kept = record(1);
            kept.payload.insert("slug".into(), json!("ada"));

            let mut txn = store.begin_write().unwrap();
            txn.put(models, kept.clone()).unwrap();
            txn.put(models, record(2)).unwrap();
            store.commit(&mut txn).unwrap();

            let mut txn = store.begin_write().unwrap();
            let doomed = txn
                .find(models, crate::store::OrderFilter::at_least(2), crate::store::SortDirection::Ascending)
                .unwrap()
                .remove(0);
            txn.delete(models, doomed.id).unwrap();
            store.commit(&mut txn).unwrap();
            (models, kept)
        };

        let store = Store::open_with_backend(Config::default(), Box::new(probe)).unwrap();
        assert_eq!(store.collection_id("models"), Some(models));
        assert_eq!(store.list(models).unwrap(), vec![kept]);
        assert_eq!(store.committed_seq(), SequenceNumber::new(3));

        // Unique index is rebuilt on recovery.
        let mut txn = store.begin_write().unwrap();
        let mut clash = record(2);
        clash.payload.insert("slug".into(), json!("ada"));
        assert!(txn.put(models, clash).is_err());
    }

    #[test]
    fn checkpoint_compacts_journal_and_preserves_state() {
        let probe = InMemoryBackend::new();
        let store = Store::open_with_backend(Config::default(), Box::new(probe.clone())).unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();
        for order in 1..=20 {
            let mut txn = store.begin_write().unwrap();
            txn.put(models, record(order)).unwrap();
            store.commit(&mut txn).unwrap();
        }
        let before = store.journal_size().unwrap();
        let listed = store.list(models).unwrap();

        store.checkpoint().unwrap();
        assert!(store.journal_size().unwrap() < before);

        let reopened = Store::open_with_backend(Config::default(), Box::new(probe)).unwrap();
        assert_eq!(reopened.list(models).unwrap(), listed);
        assert_eq!(reopened.committed_seq(), store.committed_seq());
    }

    #[test]
    fn closed_store_rejects_operations() {
        let store = Store::open_in_memory().unwrap();
        let models = store.collection(CollectionSpec::new("models")).unwrap();
        store.close().unwrap();

        assert!(!store.is_open());
        assert!(matches!(store.list(models), Err(CoreError::StoreClosed)));
        assert!(matches!(store.begin_write(), Err(CoreError::StoreClosed)));
        assert!(matches!(store.close(), Err(CoreError::StoreClosed)));
    }
}
