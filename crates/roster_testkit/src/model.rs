//! Reference model of a dense ordered collection.
//!
//! The model is a plain `Vec` of record IDs where index `i` holds order
//! `i + 1`. Every engine operation has an obvious `Vec` counterpart, so
//! driving the engine and the model side by side checks the final state
//! of each operation without caring how the engine got there.

use roster_core::{
    check_density, CoreResult, Payload, PayloadPatch, RecordId, RequestedPosition, Roster,
};

/// One mutating operation against a roster.
///
/// Records are picked by index into the current ascending order, modulo
/// the collection size, so any generated sequence is applicable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterOp {
    /// Create a record at the requested position.
    Create {
        /// Requested position; `None` appends.
        position: Option<i64>,
    },
    /// Move the picked record.
    Move {
        /// Index of the record to move.
        pick: usize,
        /// Requested target position.
        to: i64,
    },
    /// Delete the picked record.
    Delete {
        /// Index of the record to delete.
        pick: usize,
    },
}

/// Dense-order reference model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderModel {
    ids: Vec<RecordId>,
}

impl OrderModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a model from a roster's current contents.
    pub fn from_roster(roster: &Roster) -> CoreResult<Self> {
        Ok(Self {
            ids: roster.list()?.into_iter().map(|record| record.id).collect(),
        })
    }

    /// Record IDs in ascending order.
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the model is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Resolves a pick index to a record ID.
    pub fn pick(&self, pick: usize) -> Option<RecordId> {
        if self.ids.is_empty() {
            None
        } else {
            Some(self.ids[pick % self.ids.len()])
        }
    }

    /// Inserts `id` the way the position resolver places a new record.
    pub fn insert(&mut self, id: RecordId, requested: Option<i64>) {
        let n = self.ids.len() as i64;
        match requested {
            Some(position) if position >= 1 && position <= n => {
                self.ids.insert((position - 1) as usize, id);
            }
            _ => self.ids.push(id),
        }
    }

    /// Moves `id` the way the move coordinator does, including the no-op
    /// and clamping rules.
    pub fn move_to(&mut self, id: RecordId, to: i64) {
        let Some(from) = self.ids.iter().position(|x| *x == id) else {
            return;
        };
        if to < 1 || self.ids.is_empty() {
            return;
        }
        let last = self.ids.len() as i64;
        let target = (to.min(last) - 1) as usize;
        let moving = self.ids.remove(from);
        self.ids.insert(target, moving);
    }

    /// Removes `id`; later records close the gap.
    pub fn delete(&mut self, id: RecordId) {
        self.ids.retain(|x| *x != id);
    }

    /// Applies `op` to both the roster and the model.
    ///
    /// Returns the roster's error, in which case the model is unchanged.
    pub fn apply(&mut self, roster: &Roster, op: &RosterOp) -> CoreResult<()> {
        match *op {
            RosterOp::Create { position } => {
                let record = roster.create(RequestedPosition::from(position), Payload::new())?;
                self.insert(record.id, position);
            }
            RosterOp::Move { pick, to } => {
                if let Some(id) = self.pick(pick) {
                    roster.update(id, RequestedPosition::at(to), PayloadPatch::Keep)?;
                    self.move_to(id, to);
                }
            }
            RosterOp::Delete { pick } => {
                if let Some(id) = self.pick(pick) {
                    roster.delete(id)?;
                    self.delete(id);
                }
            }
        }
        Ok(())
    }

    /// Panics unless the roster holds exactly the model's sequence.
    pub fn assert_matches(&self, roster: &Roster) {
        let actual = Self::from_roster(roster).expect("Failed to list roster");
        assert_eq!(actual.ids, self.ids, "roster order diverged from model");
        assert_dense(roster);
    }
}

/// Panics unless the roster's orders are exactly `1..=N`.
pub fn assert_dense(roster: &Roster) {
    let records = roster.list().expect("Failed to list roster");
    let violations = check_density(&records);
    assert!(
        violations.is_empty(),
        "density violated in {}: {:?}",
        roster.name(),
        violations
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<RecordId> {
        (0..n).map(|_| RecordId::new()).collect()
    }

    #[test]
    fn model_insert_follows_resolver_rules() {
        let ids = ids(4);
        let mut model = OrderModel::new();
        model.insert(ids[0], None);
        model.insert(ids[1], Some(1));
        model.insert(ids[2], Some(99));
        model.insert(ids[3], Some(0));
        assert_eq!(model.ids(), &[ids[1], ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn model_move_clamps_and_ignores_nonpositive() {
        let ids = ids(3);
        let mut model = OrderModel::new();
        for id in &ids {
            model.insert(*id, None);
        }

        model.move_to(ids[0], 0);
        assert_eq!(model.ids(), &ids[..]);
        model.move_to(ids[0], 10);
        assert_eq!(model.ids(), &[ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn pick_wraps_around() {
        let ids = ids(2);
        let mut model = OrderModel::new();
        assert_eq!(model.pick(5), None);
        model.insert(ids[0], None);
        model.insert(ids[1], None);
        assert_eq!(model.pick(3), Some(ids[1]));
    }
}
