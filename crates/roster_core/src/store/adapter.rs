//! The store adapter seam used by the position engine.

use crate::error::CoreResult;
use crate::record::{OrderedRecord, RecordId};
use crate::types::CollectionId;

/// Sort direction for an order-range read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Lowest order first.
    Ascending,
    /// Highest order first.
    Descending,
}

/// Inclusive bounds on the order values a read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderFilter {
    /// Lowest order returned, if bounded.
    pub min: Option<u32>,
    /// Highest order returned, if bounded.
    pub max: Option<u32>,
}

impl OrderFilter {
    /// Every record.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Records with `order >= min`.
    #[must_use]
    pub const fn at_least(min: u32) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Records with `min <= order <= max`.
    #[must_use]
    pub const fn between(min: u32, max: u32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Returns true if `order` passes the filter.
    #[must_use]
    pub fn contains(&self, order: u32) -> bool {
        self.min.map_or(true, |min| order >= min) && self.max.map_or(true, |max| order <= max)
    }
}

/// Reads and writes of ordered records inside one active transaction.
///
/// Implementations enforce a unique index on `order` (and on the
/// collection's unique payload fields) at every write: a single-row
/// `put` that would give two records the same order fails with
/// `ConstraintViolation`, even if a later write in the same transaction
/// would have resolved it. `put_many` checks the batch as a whole.
pub trait OrderedTxn {
    /// Gets a record by ID.
    fn get(&mut self, collection: CollectionId, id: RecordId) -> CoreResult<Option<OrderedRecord>>;

    /// Reads the records passing `filter`, sorted by order.
    fn find(
        &mut self,
        collection: CollectionId,
        filter: OrderFilter,
        sort: SortDirection,
    ) -> CoreResult<Vec<OrderedRecord>>;

    /// Returns the highest order in the collection, or 0 if it is empty.
    fn max_order(&mut self, collection: CollectionId) -> CoreResult<u32> {
        Ok(self
            .find(collection, OrderFilter::all(), SortDirection::Descending)?
            .first()
            .map_or(0, |record| record.order))
    }

    /// Inserts or replaces one record.
    fn put(&mut self, collection: CollectionId, record: OrderedRecord) -> CoreResult<()>;

    /// Inserts or replaces several records as one set-based write.
    fn put_many(&mut self, collection: CollectionId, records: Vec<OrderedRecord>)
        -> CoreResult<()>;

    /// Deletes a record, returning it if it existed.
    fn delete(&mut self, collection: CollectionId, id: RecordId)
        -> CoreResult<Option<OrderedRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_bounds_are_inclusive() {
        let filter = OrderFilter::between(2, 4);
        assert!(!filter.contains(1));
        assert!(filter.contains(2));
        assert!(filter.contains(4));
        assert!(!filter.contains(5));
        assert!(OrderFilter::at_least(3).contains(u32::MAX));
        assert!(OrderFilter::all().contains(0));
    }
}
