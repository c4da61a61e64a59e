//! Create, update and delete flows over one ordered collection.

use crate::engine::{RequestedPosition, TransactionCoordinator};
use crate::error::{CoreError, CoreResult};
use crate::record::{OrderedRecord, Payload, PayloadPatch, RecordId};
use crate::store::{CollectionSpec, OrderedTxn, Store};
use crate::types::CollectionId;
use crate::verify::{check_density, DensityViolation};
use std::sync::Arc;
use tracing::{debug, warn};

/// Error returned by a [`CleanupHook`].
pub type CleanupError = Box<dyn std::error::Error + Send + Sync>;

/// Why a record version is handed to the cleanup hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupReason {
    /// The record was deleted.
    Deleted,
    /// The record's payload was replaced by an update.
    Replaced,
}

/// Releases resources a record refers to (uploaded files and the like).
///
/// Called only after the transaction that deleted or replaced the record
/// has committed. Failures are logged and never undo the commit.
pub trait CleanupHook: Send + Sync {
    /// Releases whatever `record` refers to.
    fn release(&self, record: &OrderedRecord, reason: CleanupReason) -> Result<(), CleanupError>;
}

/// An ordered collection with dense positions.
///
/// ```rust
/// use roster_core::{CollectionSpec, Payload, PayloadPatch, RequestedPosition, Roster, Store};
/// use std::sync::Arc;
///
/// let store = Arc::new(Store::open_in_memory().unwrap());
/// let models = Roster::open(store, CollectionSpec::new("models")).unwrap();
///
/// let a = models.create(RequestedPosition::absent(), Payload::new()).unwrap();
/// let b = models.create(RequestedPosition::absent(), Payload::new()).unwrap();
/// models.update(b.id, RequestedPosition::at(1), PayloadPatch::Keep).unwrap();
/// models.delete(a.id).unwrap();
///
/// assert_eq!(models.get(b.id).unwrap().unwrap().order, 1);
/// ```
pub struct Roster {
    store: Arc<Store>,
    collection: CollectionId,
    name: String,
    cleanup: Option<Arc<dyn CleanupHook>>,
}

impl Roster {
    /// Registers (or reopens) the collection described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be registered.
    pub fn open(store: Arc<Store>, spec: CollectionSpec) -> CoreResult<Self> {
        let name = spec.name.clone();
        let collection = store.collection(spec)?;
        Ok(Self {
            store,
            collection,
            name,
            cleanup: None,
        })
    }

    /// Sets the hook called after deletes and payload replacements.
    #[must_use]
    pub fn with_cleanup(mut self, hook: Arc<dyn CleanupHook>) -> Self {
        self.cleanup = Some(hook);
        self
    }

    /// Returns the collection ID.
    #[must_use]
    pub fn collection(&self) -> CollectionId {
        self.collection
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Creates a record at the requested position.
    ///
    /// A missing, non-positive or past-the-end position appends. Otherwise
    /// the records at and after the position shift up by one.
    ///
    /// # Errors
    ///
    /// - `ConstraintViolation` if the payload breaks a unique field; the
    ///   shift is rolled back with it
    /// - `TransactionConflict` in optimistic mode
    /// - store errors
    pub fn create(&self, requested: RequestedPosition, payload: Payload) -> CoreResult<OrderedRecord> {
        let collection = self.collection;
        let record = self.coordinator().run_ordered_mutation(move |m| {
            let position = m.make_room(collection, requested)?;
            let record = OrderedRecord::new(RecordId::new(), position.order(), payload);
            m.txn().put(collection, record.clone())?;
            Ok(record)
        })?;

        debug!(collection = %self.name, record = %record.id, order = record.order, "created record");
        Ok(record)
    }

    /// Updates a record: moves it if a different position is requested,
    /// then applies `patch` to its payload.
    ///
    /// Both happen in one transaction. If the payload changed, the previous
    /// version is handed to the cleanup hook after commit.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist
    /// - `ConstraintViolation` if the patched payload breaks a unique
    ///   field; any move is rolled back with it
    /// - store errors
    pub fn update(
        &self,
        id: RecordId,
        requested: RequestedPosition,
        patch: PayloadPatch,
    ) -> CoreResult<OrderedRecord> {
        let collection = self.collection;
        let name = self.name.as_str();

        let (updated, replaced) = self.coordinator().run_ordered_mutation(|m| {
            let previous = m
                .txn()
                .get(collection, id)?
                .ok_or_else(|| CoreError::not_found(name, id))?;

            if let Some(to) = requested.value() {
                let max_order = m.max_order(collection)?;
                m.move_to(collection, id, previous.order, to, max_order)?;
            }

            let mut updated = m
                .txn()
                .get(collection, id)?
                .ok_or_else(|| CoreError::not_found(name, id))?;
            let changed = patch.apply(&mut updated.payload);
            if changed {
                m.txn().put(collection, updated.clone())?;
            }
            Ok((updated, changed.then_some(previous)))
        })?;

        debug!(collection = %self.name, record = %id, order = updated.order, "updated record");
        if let Some(previous) = replaced {
            self.release(&previous, CleanupReason::Replaced);
        }
        Ok(updated)
    }

    /// Deletes a record and closes the gap it leaves.
    ///
    /// The deleted record is handed to the cleanup hook after commit.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist
    /// - store errors
    pub fn delete(&self, id: RecordId) -> CoreResult<OrderedRecord> {
        let collection = self.collection;
        let name = self.name.as_str();

        let removed = self.coordinator().run_ordered_mutation(|m| {
            let removed = m
                .txn()
                .delete(collection, id)?
                .ok_or_else(|| CoreError::not_found(name, id))?;
            m.compact_after_delete(collection, removed.order)?;
            Ok(removed)
        })?;

        debug!(collection = %self.name, record = %id, order = removed.order, "deleted record");
        self.release(&removed, CleanupReason::Deleted);
        Ok(removed)
    }

    /// Returns every record in ascending order, from the latest commit.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` if the store is closed.
    pub fn list(&self) -> CoreResult<Vec<OrderedRecord>> {
        self.store.list(self.collection)
    }

    /// Gets a record from the latest commit.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` if the store is closed.
    pub fn get(&self, id: RecordId) -> CoreResult<Option<OrderedRecord>> {
        self.store.get(self.collection, id)
    }

    /// Number of records.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` if the store is closed.
    pub fn len(&self) -> CoreResult<usize> {
        self.store.count(self.collection)
    }

    /// Returns true if the collection has no records.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` if the store is closed.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Checks the latest commit for gaps and duplicates.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` if the store is closed.
    pub fn verify(&self) -> CoreResult<Vec<DensityViolation>> {
        Ok(check_density(&self.list()?))
    }

    fn coordinator(&self) -> TransactionCoordinator<'_> {
        TransactionCoordinator::new(&self.store)
    }

    fn release(&self, record: &OrderedRecord, reason: CleanupReason) {
        let Some(hook) = &self.cleanup else {
            return;
        };
        if let Err(err) = hook.release(record, reason) {
            warn!(
                collection = %self.name,
                record = %record.id,
                ?reason,
                error = %err,
                "cleanup hook failed"
            );
        }
    }
}

impl std::fmt::Debug for Roster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Roster")
            .field("collection", &self.collection)
            .field("name", &self.name)
            .field("has_cleanup", &self.cleanup.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ShiftMode};
    use parking_lot::Mutex;
    use roster_storage::InMemoryBackend;
    use serde_json::json;

    fn payload(name: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert("name".into(), json!(name));
        payload.insert("slug".into(), json!(name.to_lowercase()));
        payload
    }

    fn models(config: Config) -> Roster {
        let store = Arc::new(Store::open_in_memory_with_config(config).unwrap());
        Roster::open(store, CollectionSpec::new("models").unique("slug")).unwrap()
    }

    fn names(roster: &Roster) -> Vec<(String, u32)> {
        roster
            .list()
            .unwrap()
            .into_iter()
            .map(|r| (r.payload["name"].as_str().unwrap().to_owned(), r.order))
            .collect()
    }

    fn named(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
        pairs.iter().map(|(n, o)| ((*n).to_owned(), *o)).collect()
    }

    #[test]
    fn insert_move_delete_scenario() {
        for mode in [ShiftMode::RowByRow, ShiftMode::Ranged] {
            let roster = models(Config::new().shift_mode(mode));
            let a = roster.create(RequestedPosition::absent(), payload("A")).unwrap();
            roster.create(RequestedPosition::absent(), payload("B")).unwrap();
            let c = roster.create(RequestedPosition::absent(), payload("C")).unwrap();
            assert_eq!(names(&roster), named(&[("A", 1), ("B", 2), ("C", 3)]));

            let d = roster.create(RequestedPosition::at(2), payload("D")).unwrap();
            assert_eq!(d.order, 2);
            assert_eq!(
                names(&roster),
                named(&[("A", 1), ("D", 2), ("B", 3), ("C", 4)])
            );

            let moved = roster
                .update(c.id, RequestedPosition::at(1), PayloadPatch::Keep)
                .unwrap();
            assert_eq!(moved.order, 1);
            assert_eq!(
                names(&roster),
                named(&[("C", 1), ("A", 2), ("D", 3), ("B", 4)])
            );

            let removed = roster.delete(a.id).unwrap();
            assert_eq!(removed.order, 2);
            assert_eq!(names(&roster), named(&[("C", 1), ("D", 2), ("B", 3)]));
            assert!(roster.verify().unwrap().is_empty());
        }
    }

    #[test]
    fn out_of_range_positions_append() {
        let roster = models(Config::default());
        roster.create(RequestedPosition::absent(), payload("A")).unwrap();

        let b = roster.create(RequestedPosition::at(9), payload("B")).unwrap();
        let c = roster.create(RequestedPosition::at(0), payload("C")).unwrap();
        let d = roster.create(RequestedPosition::parse("soon"), payload("D")).unwrap();
        assert_eq!((b.order, c.order, d.order), (2, 3, 4));
    }

    #[test]
    fn unique_violation_after_shift_rolls_back_everything() {
        let roster = models(Config::default());
        for name in ["A", "B", "C"] {
            roster.create(RequestedPosition::absent(), payload(name)).unwrap();
        }
        let before = roster.list().unwrap();

        let err = roster
            .create(RequestedPosition::at(1), payload("B"))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConstraintViolation { ref field, ref value, .. }
                if field == "slug" && value == "b"
        ));
        assert_eq!(roster.list().unwrap(), before);
    }

    #[test]
    fn unique_violation_on_update_rolls_back_the_move() {
        let roster = models(Config::default());
        roster.create(RequestedPosition::absent(), payload("A")).unwrap();
        let b = roster.create(RequestedPosition::absent(), payload("B")).unwrap();
        let before = roster.list().unwrap();

        let mut clash = Payload::new();
        clash.insert("slug".into(), json!("a"));
        let err = roster
            .update(b.id, RequestedPosition::at(1), PayloadPatch::Merge(clash))
            .unwrap_err();

        assert!(matches!(err, CoreError::ConstraintViolation { .. }));
        assert_eq!(roster.list().unwrap(), before);
    }

    #[test]
    fn update_without_position_keeps_order() {
        let roster = models(Config::default());
        roster.create(RequestedPosition::absent(), payload("A")).unwrap();
        let b = roster.create(RequestedPosition::absent(), payload("B")).unwrap();

        let mut edit = Payload::new();
        edit.insert("height".into(), json!(180));
        let updated = roster
            .update(b.id, RequestedPosition::absent(), PayloadPatch::Merge(edit))
            .unwrap();

        assert_eq!(updated.order, 2);
        assert_eq!(updated.payload["height"], json!(180));
        assert_eq!(updated.payload["name"], json!("B"));
    }

    #[test]
    fn missing_records_are_not_found() {
        let roster = models(Config::default());
        let ghost = RecordId::new();
        let seq = roster.store().committed_seq();

        assert!(matches!(
            roster.update(ghost, RequestedPosition::at(1), PayloadPatch::Keep),
            Err(CoreError::NotFound { ref collection, .. }) if collection == "models"
        ));
        assert!(matches!(
            roster.delete(ghost),
            Err(CoreError::NotFound { .. })
        ));
        assert_eq!(roster.store().committed_seq(), seq);
    }

    #[derive(Default)]
    struct RecordingHook {
        released: Mutex<Vec<(RecordId, CleanupReason)>>,
        fail: bool,
    }

    impl CleanupHook for RecordingHook {
        fn release(&self, record: &OrderedRecord, reason: CleanupReason) -> Result<(), CleanupError> {
            self.released.lock().push((record.id, reason));
            if self.fail {
                return Err("disk full".into());
            }
            Ok(())
        }
    }

    #[test]
    fn cleanup_runs_after_commit_only() {
        let hook = Arc::new(RecordingHook::default());
        let roster = models(Config::default()).with_cleanup(hook.clone());
        let a = roster.create(RequestedPosition::absent(), payload("A")).unwrap();
        let b = roster.create(RequestedPosition::absent(), payload("B")).unwrap();

        // Move only: nothing replaced.
        roster.update(b.id, RequestedPosition::at(1), PayloadPatch::Keep).unwrap();
        assert!(hook.released.lock().is_empty());

        roster
            .update(a.id, RequestedPosition::absent(), PayloadPatch::Replace(payload("Ann")))
            .unwrap();
        roster.delete(b.id).unwrap();
        assert!(roster.delete(b.id).is_err());

        assert_eq!(
            *hook.released.lock(),
            vec![(a.id, CleanupReason::Replaced), (b.id, CleanupReason::Deleted)]
        );
    }

    #[test]
    fn cleanup_failure_does_not_undo_delete() {
        let hook = Arc::new(RecordingHook {
            fail: true,
            ..RecordingHook::default()
        });
        let roster = models(Config::default()).with_cleanup(hook.clone());
        let a = roster.create(RequestedPosition::absent(), payload("A")).unwrap();

        roster.delete(a.id).unwrap();
        assert!(roster.is_empty().unwrap());
        assert_eq!(hook.released.lock().len(), 1);
    }

    #[test]
    fn unavailable_store_fails_the_request_only() {
        let probe = InMemoryBackend::new();
        let store =
            Arc::new(Store::open_with_backend(Config::default(), Box::new(probe.clone())).unwrap());
        let roster = Roster::open(store, CollectionSpec::new("models")).unwrap();
        roster.create(RequestedPosition::absent(), payload("A")).unwrap();
        let before = roster.list().unwrap();

        probe.set_unavailable(true);
        let err = roster
            .create(RequestedPosition::at(1), payload("B"))
            .unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(roster.list().unwrap(), before);

        probe.set_unavailable(false);
        roster.create(RequestedPosition::at(1), payload("B")).unwrap();
        assert_eq!(roster.len().unwrap(), 2);
    }
}
