//! Transaction coordinator: every ordered mutation is one atomic unit.

use crate::config::ShiftMode;
use crate::engine::moves::{self, MoveOutcome};
use crate::engine::position::{resolve_insert_position, InsertPosition, RequestedPosition};
use crate::engine::shift;
use crate::error::CoreResult;
use crate::record::RecordId;
use crate::store::{OrderedTxn, Store, WriteTransaction};
use crate::types::{CollectionId, SequenceNumber};
use tracing::{debug, warn};

/// Opens, commits and aborts the transactions the engine runs in.
///
/// Nothing else in the engine begins or ends a transaction. A mutation
/// body either finishes and is committed whole, or fails and leaves the
/// store exactly as it was.
#[derive(Debug, Clone, Copy)]
pub struct TransactionCoordinator<'s> {
    store: &'s Store,
}

impl<'s> TransactionCoordinator<'s> {
    /// Creates a coordinator over a store.
    #[must_use]
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Runs `body` in a fresh write transaction.
    ///
    /// Commits and returns the body's result if it succeeds. If the body
    /// (or the commit) fails, the transaction is aborted before the error
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns the body's error unchanged, or the commit error.
    pub fn run_ordered_mutation<F, T>(&self, body: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Mutation<'_, 's>) -> CoreResult<T>,
    {
        self.run_with_seq(body).map(|(value, _)| value)
    }

    /// Like [`run_ordered_mutation`](Self::run_ordered_mutation), also
    /// returning the commit sequence.
    ///
    /// # Errors
    ///
    /// See [`run_ordered_mutation`](Self::run_ordered_mutation).
    pub fn run_with_seq<F, T>(&self, body: F) -> CoreResult<(T, SequenceNumber)>
    where
        F: FnOnce(&mut Mutation<'_, 's>) -> CoreResult<T>,
    {
        let mut txn = self.store.begin_write()?;
        let shift_mode = self.store.config().shift_mode;

        let result = body(&mut Mutation {
            txn: &mut txn,
            shift_mode,
        });

        match result {
            Ok(value) => {
                let seq = self.store.commit(&mut txn)?;
                Ok((value, seq))
            }
            Err(err) => {
                debug!(txn = %txn.id(), error = %err, "mutation failed, aborting");
                if txn.is_active() {
                    if let Err(abort_err) = self.store.abort(&mut txn) {
                        warn!(txn = %txn.id(), error = %abort_err, "abort failed");
                    }
                }
                Err(err)
            }
        }
    }
}

/// The engine operations available inside one coordinated transaction.
pub struct Mutation<'m, 's> {
    txn: &'m mut WriteTransaction<'s>,
    shift_mode: ShiftMode,
}

impl<'s> Mutation<'_, 's> {
    /// The underlying transaction, for plain record reads and writes.
    pub fn txn(&mut self) -> &mut WriteTransaction<'s> {
        &mut *self.txn
    }

    /// The shift strategy in effect.
    #[must_use]
    pub fn shift_mode(&self) -> ShiftMode {
        self.shift_mode
    }

    /// Runs `body` inside the active transaction.
    ///
    /// Nested bodies never commit or abort; their errors propagate to the
    /// outermost coordinated call.
    ///
    /// # Errors
    ///
    /// Returns the body's error.
    pub fn nested<F, T>(&mut self, body: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Mutation<'_, 's>) -> CoreResult<T>,
    {
        body(&mut Mutation {
            txn: &mut *self.txn,
            shift_mode: self.shift_mode,
        })
    }

    /// Highest order in the collection as seen by this transaction.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn max_order(&mut self, collection: CollectionId) -> CoreResult<u32> {
        self.txn.max_order(collection)
    }

    /// Resolves where a new record goes and shifts the tail if needed.
    ///
    /// After this returns, the resolved slot is free.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn make_room(
        &mut self,
        collection: CollectionId,
        requested: RequestedPosition,
    ) -> CoreResult<InsertPosition> {
        let max_order = self.max_order(collection)?;
        let position = resolve_insert_position(requested.value(), max_order);
        if position.requires_shift() {
            self.shift_up_from(collection, position.order())?;
        }
        Ok(position)
    }

    /// Shifts every record at or above `position` up by one.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn shift_up_from(&mut self, collection: CollectionId, position: u32) -> CoreResult<usize> {
        shift::shift_up_from(&mut *self.txn, collection, position, self.shift_mode)
    }

    /// Moves an existing record; see [`moves::move_to`].
    ///
    /// # Errors
    ///
    /// See [`moves::move_to`].
    pub fn move_to(
        &mut self,
        collection: CollectionId,
        id: RecordId,
        from: u32,
        to: i64,
        max_order: u32,
    ) -> CoreResult<MoveOutcome> {
        moves::move_to(
            &mut *self.txn,
            collection,
            id,
            from,
            to,
            max_order,
            self.shift_mode,
        )
    }

    /// Closes the gap left by a record deleted in this transaction.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub fn compact_after_delete(
        &mut self,
        collection: CollectionId,
        deleted_order: u32,
    ) -> CoreResult<usize> {
        shift::compact_after_delete(&mut *self.txn, collection, deleted_order, self.shift_mode)
    }
}

impl std::fmt::Debug for Mutation<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("txn", &self.txn.id())
            .field("shift_mode", &self.shift_mode)
            .finish()
    }
}
