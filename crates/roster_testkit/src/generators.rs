//! Property-based test generators using proptest.
//!
//! Provides strategies for generating requested positions and operation
//! sequences against an ordered collection.

use crate::model::RosterOp;
use proptest::prelude::*;
use roster_core::RecordId;

/// Strategy for generating record IDs.
pub fn record_id_strategy() -> impl Strategy<Value = RecordId> {
    prop::array::uniform16(any::<u8>()).prop_map(RecordId::from_bytes)
}

/// Strategy for requested positions, biased towards interesting values:
/// absent, non-positive, small in-range values and far past the end.
pub fn requested_position_strategy() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![
        2 => Just(None),
        1 => (-3i64..=0).prop_map(Some),
        5 => (1i64..=12).prop_map(Some),
        1 => (1_000i64..=i64::MAX).prop_map(Some),
    ]
}

/// Strategy for raw client position text.
pub fn raw_position_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        prop::string::string_regex("[ a-z0-9.+-]{0,6}").expect("Invalid regex"),
    ]
}

/// Strategy for one roster operation.
pub fn roster_op_strategy() -> impl Strategy<Value = RosterOp> {
    prop_oneof![
        4 => requested_position_strategy().prop_map(|position| RosterOp::Create { position }),
        3 => (any::<usize>(), -1i64..=14).prop_map(|(pick, to)| RosterOp::Move { pick, to }),
        2 => any::<usize>().prop_map(|pick| RosterOp::Delete { pick }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn roster_op_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<RosterOp>> {
    prop::collection::vec(roster_op_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
