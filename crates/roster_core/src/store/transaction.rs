//! Write transactions.

use crate::error::{CoreError, CoreResult};
use crate::record::{OrderedRecord, RecordId};
use crate::store::adapter::{OrderFilter, OrderedTxn, SortDirection};
use crate::store::collection::CollectionData;
use crate::store::journal::JournalOp;
use crate::store::manager::CommittedState;
use crate::types::{CollectionId, SequenceNumber, TransactionId};
use parking_lot::MutexGuard;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// An active write transaction.
///
/// Reads see the snapshot the transaction started from plus its own
/// writes. Writes go to private copies of the touched collections, so
/// nothing is visible to anyone else until [`crate::Store::commit`]
/// publishes them. Dropping an uncommitted transaction discards it.
///
/// In single-writer mode the transaction holds the store's write lock
/// until it is committed, aborted or dropped.
pub struct WriteTransaction<'a> {
    id: TransactionId,
    base: Arc<CommittedState>,
    working: HashMap<CollectionId, CollectionData>,
    reads: HashSet<CollectionId>,
    touched: BTreeSet<(CollectionId, RecordId)>,
    write_count: usize,
    state: TransactionState,
    _write_guard: Option<MutexGuard<'a, ()>>,
}

impl<'a> WriteTransaction<'a> {
    pub(crate) fn new(
        id: TransactionId,
        base: Arc<CommittedState>,
        write_guard: Option<MutexGuard<'a, ()>>,
    ) -> Self {
        Self {
            id,
            base,
            working: HashMap::new(),
            reads: HashSet::new(),
            touched: BTreeSet::new(),
            write_count: 0,
            state: TransactionState::Active,
            _write_guard: write_guard,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the sequence number this transaction reads from.
    #[must_use]
    pub fn snapshot_seq(&self) -> SequenceNumber {
        self.base.seq
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Number of single-record writes issued so far.
    ///
    /// A `put_many` of `n` records counts `n`.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    /// Returns true if the transaction has changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Collections read or written, for conflict validation.
    pub(crate) fn accessed_collections(&self) -> impl Iterator<Item = CollectionId> + '_ {
        self.reads.iter().chain(self.working.keys()).copied()
    }

    /// Final state of every touched record, in a deterministic order.
    pub(crate) fn journal_ops(&self) -> Vec<JournalOp> {
        self.touched
            .iter()
            .map(|&(collection, id)| {
                match self.working.get(&collection).and_then(|data| data.get(id)) {
                    Some(record) => JournalOp::Put {
                        collection,
                        record: record.clone(),
                    },
                    None => JournalOp::Delete { collection, id },
                }
            })
            .collect()
    }

    /// Hands the working copies over for publication.
    pub(crate) fn take_working(&mut self) -> HashMap<CollectionId, CollectionData> {
        std::mem::take(&mut self.working)
    }

    pub(crate) fn mark_committed(&mut self) {
        self.state = TransactionState::Committed;
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.state = TransactionState::Aborted;
        self.working.clear();
        self.touched.clear();
    }

    pub(crate) fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::Aborted => {
                Err(CoreError::invalid_operation("transaction already aborted"))
            }
        }
    }

    fn view(&mut self, collection: CollectionId) -> CoreResult<&CollectionData> {
        self.ensure_active()?;
        self.reads.insert(collection);
        if let Some(data) = self.working.get(&collection) {
            return Ok(data);
        }
        self.base
            .collection(collection)
            .map(|data| data.as_ref())
    }

    fn view_mut(&mut self, collection: CollectionId) -> CoreResult<&mut CollectionData> {
        self.ensure_active()?;
        match self.working.entry(collection) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let base = self.base.collection(collection)?;
                Ok(entry.insert(CollectionData::clone(base)))
            }
        }
    }
}

impl OrderedTxn for WriteTransaction<'_> {
    fn get(&mut self, collection: CollectionId, id: RecordId) -> CoreResult<Option<OrderedRecord>> {
        Ok(self.view(collection)?.get(id).cloned())
    }

    fn find(
        &mut self,
        collection: CollectionId,
        filter: OrderFilter,
        sort: SortDirection,
    ) -> CoreResult<Vec<OrderedRecord>> {
        Ok(self.view(collection)?.scan(filter, sort))
    }

    fn max_order(&mut self, collection: CollectionId) -> CoreResult<u32> {
        Ok(self.view(collection)?.max_order())
    }

    fn put(&mut self, collection: CollectionId, record: OrderedRecord) -> CoreResult<()> {
        let id = record.id;
        self.view_mut(collection)?.put(record)?;
        self.touched.insert((collection, id));
        self.write_count += 1;
        Ok(())
    }

    fn put_many(
        &mut self,
        collection: CollectionId,
        records: Vec<OrderedRecord>,
    ) -> CoreResult<()> {
        let ids: Vec<RecordId> = records.iter().map(|record| record.id).collect();
        self.view_mut(collection)?.put_many(records)?;
        self.write_count += ids.len();
        self.touched
            .extend(ids.into_iter().map(|id| (collection, id)));
        Ok(())
    }

    fn delete(
        &mut self,
        collection: CollectionId,
        id: RecordId,
    ) -> CoreResult<Option<OrderedRecord>> {
        let removed = self.view_mut(collection)?.delete(id);
        if removed.is_some() {
            self.touched.insert((collection, id));
            self.write_count += 1;
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for WriteTransaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTransaction")
            .field("id", &self.id)
            .field("snapshot_seq", &self.base.seq)
            .field("state", &self.state)
            .field("write_count", &self.write_count)
            .finish_non_exhaustive()
    }
}
