//! Repositioning of existing records (quarantine-and-shift).

use crate::config::ShiftMode;
use crate::engine::shift::{shift_range, Step};
use crate::error::{CoreError, CoreResult};
use crate::record::RecordId;
use crate::store::{OrderFilter, OrderedTxn};
use crate::types::CollectionId;
use tracing::debug;

/// Distance above `max_order` at which a moving record is parked.
pub const QUARANTINE_OFFSET: u32 = 2;

/// Result of [`move_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing was written.
    Unchanged,
    /// The record now sits at `to`.
    Moved {
        /// Previous order.
        from: u32,
        /// New order.
        to: u32,
    },
}

impl MoveOutcome {
    /// Returns true if the record changed position.
    #[must_use]
    pub const fn is_moved(self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Moves record `id` from order `from` to order `to`.
///
/// A `to` below 1 or equal to `from` leaves everything untouched. A `to`
/// past `max_order` is clamped to `max_order`, the last slot.
///
/// The record is first parked at `max_order + 2`, which no live record
/// can hold. The records between the two slots then shift one step
/// towards the vacated slot, and finally the record takes `to`.
///
/// # Errors
///
/// - `NotFound` if the record does not exist
/// - `InvalidOperation` if `from` is not the record's current order or
///   lies outside `1..=max_order`
/// - store errors from any of the writes
///
/// Any error leaves the transaction half-moved; it must be aborted.
pub fn move_to<T: OrderedTxn + ?Sized>(
    txn: &mut T,
    collection: CollectionId,
    id: RecordId,
    from: u32,
    to: i64,
    max_order: u32,
    mode: ShiftMode,
) -> CoreResult<MoveOutcome> {
    if to < 1 {
        return Ok(MoveOutcome::Unchanged);
    }
    let to = u32::try_from(to).unwrap_or(u32::MAX).min(max_order);
    if to == from {
        return Ok(MoveOutcome::Unchanged);
    }

    let record = txn
        .get(collection, id)?
        .ok_or_else(|| CoreError::not_found(collection.to_string(), id))?;
    if record.order != from {
        return Err(CoreError::invalid_operation(format!(
            "record {id} is at order {}, not {from}",
            record.order
        )));
    }
    if from < 1 || from > max_order {
        return Err(CoreError::invalid_operation(format!(
            "order {from} is outside 1..={max_order}"
        )));
    }
    let quarantine = max_order.checked_add(QUARANTINE_OFFSET).ok_or_else(|| {
        CoreError::invalid_operation(format!("no quarantine slot above order {max_order}"))
    })?;

    debug!(collection = %collection, record = %id, quarantine, "parking record");
    txn.put(collection, record.at_order(quarantine))?;

    let (range, step) = if to < from {
        (OrderFilter::between(to, from - 1), Step::Up)
    } else {
        (OrderFilter::between(from + 1, to), Step::Down)
    };
    shift_range(txn, collection, range, step, mode)?;

    txn.put(collection, record.at_order(to))?;
    debug!(collection = %collection, record = %id, from, to, "moved record");
    Ok(MoveOutcome::Moved { from, to })
}
