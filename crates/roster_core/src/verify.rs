//! Density checks over a collection snapshot.

use crate::record::{OrderedRecord, RecordId};
use std::collections::BTreeMap;
use std::fmt;

/// A way in which a collection's orders fail to be exactly `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DensityViolation {
    /// Several records share an order.
    Duplicate {
        /// The shared order.
        order: u32,
        /// Every record holding it.
        ids: Vec<RecordId>,
    },
    /// No record holds this order.
    Gap {
        /// The missing order.
        order: u32,
    },
    /// A record's order lies outside `1..=N`.
    OutOfRange {
        /// The offending record.
        id: RecordId,
        /// Its order.
        order: u32,
    },
}

impl fmt::Display for DensityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { order, ids } => {
                write!(f, "order {order} held by {} records", ids.len())
            }
            Self::Gap { order } => write!(f, "order {order} is missing"),
            Self::OutOfRange { id, order } => write!(f, "record {id} has out-of-range order {order}"),
        }
    }
}

/// Checks that `records` hold exactly the orders `1..=N`, each once.
///
/// Returns every violation found, out-of-range records first, then
/// duplicates and gaps by ascending order. An empty result means the
/// collection is dense.
#[must_use]
pub fn check_density(records: &[OrderedRecord]) -> Vec<DensityViolation> {
    let n = u32::try_from(records.len()).unwrap_or(u32::MAX);
    let mut by_order: BTreeMap<u32, Vec<RecordId>> = BTreeMap::new();
    let mut violations = Vec::new();

    for record in records {
        if record.order < 1 || record.order > n {
            violations.push(DensityViolation::OutOfRange {
                id: record.id,
                order: record.order,
            });
        } else {
            by_order.entry(record.order).or_default().push(record.id);
        }
    }

    for order in 1..=n {
        match by_order.remove(&order) {
            None => violations.push(DensityViolation::Gap { order }),
            Some(ids) if ids.len() > 1 => {
                violations.push(DensityViolation::Duplicate { order, ids });
            }
            Some(_) => {}
        }
    }
    violations
}
