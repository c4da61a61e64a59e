//! Range shifting and post-delete compaction.
//!
//! The store rejects any single-row write that would give two records the
//! same order, so a row-by-row shift must walk the range away from the
//! slot it is moving into: descending when incrementing, ascending when
//! decrementing. Each write then lands on a slot its previous owner has
//! already left.

use crate::config::ShiftMode;
use crate::error::CoreResult;
use crate::store::{OrderFilter, OrderedTxn, SortDirection};
use crate::types::CollectionId;
use tracing::debug;

/// Direction of a ±1 shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Up,
    Down,
}

impl Step {
    /// The processing order that never collides for this direction.
    pub(crate) const fn safe_order(self) -> SortDirection {
        match self {
            Self::Up => SortDirection::Descending,
            Self::Down => SortDirection::Ascending,
        }
    }

    fn apply(self, order: u32) -> u32 {
        match self {
            Self::Up => order + 1,
            Self::Down => order - 1,
        }
    }
}

/// Shifts every record in `range` by one step.
///
/// Returns the number of records rewritten.
pub(crate) fn shift_range<T: OrderedTxn + ?Sized>(
    txn: &mut T,
    collection: CollectionId,
    range: OrderFilter,
    step: Step,
    mode: ShiftMode,
) -> CoreResult<usize> {
    let affected = txn.find(collection, range, step.safe_order())?;
    let count = affected.len();
    debug!(
        collection = %collection,
        min = ?range.min,
        max = ?range.max,
        ?step,
        ?mode,
        count,
        "shifting order range"
    );

    match mode {
        ShiftMode::RowByRow => {
            for record in affected {
                let next = step.apply(record.order);
                txn.put(collection, record.at_order(next))?;
            }
        }
        ShiftMode::Ranged => {
            if count > 0 {
                let staged = affected
                    .iter()
                    .map(|record| record.at_order(step.apply(record.order)))
                    .collect();
                txn.put_many(collection, staged)?;
            }
        }
    }
    Ok(count)
}

/// Makes room at `position`: every record with `order >= position` moves
/// up by one.
///
/// # Errors
///
/// Propagates store errors; the caller's transaction must then abort.
pub fn shift_up_from<T: OrderedTxn + ?Sized>(
    txn: &mut T,
    collection: CollectionId,
    position: u32,
    mode: ShiftMode,
) -> CoreResult<usize> {
    shift_range(txn, collection, OrderFilter::at_least(position), Step::Up, mode)
}

/// Closes the gap left by a deleted record: every record with
/// `order > deleted_order` moves down by one.
///
/// Must run in the transaction that deleted the record.
///
/// # Errors
///
/// Propagates store errors; the caller's transaction must then abort.
pub fn compact_after_delete<T: OrderedTxn + ?Sized>(
    txn: &mut T,
    collection: CollectionId,
    deleted_order: u32,
    mode: ShiftMode,
) -> CoreResult<usize> {
    let Some(first) = deleted_order.checked_add(1) else {
        return Ok(0);
    };
    debug!(collection = %collection, deleted_order, "compacting after delete");
    shift_range(txn, collection, OrderFilter::at_least(first), Step::Down, mode)
}
