//! The ordered record and payload edits.

use crate::record::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name under which the order value is reported in constraint errors.
pub const ORDER_FIELD: &str = "order";

/// Opaque record payload. The engine only looks inside it to enforce
/// the unique fields declared on the collection.
pub type Payload = Map<String, Value>;

/// A record in an ordered collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedRecord {
    /// Immutable identity.
    pub id: RecordId,
    /// 1-based display position.
    pub order: u32,
    /// Opaque payload.
    pub payload: Payload,
}

impl OrderedRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(id: RecordId, order: u32, payload: Payload) -> Self {
        Self { id, order, payload }
    }

    /// Returns a copy of this record at another order.
    #[must_use]
    pub fn at_order(&self, order: u32) -> Self {
        Self {
            order,
            ..self.clone()
        }
    }
}

/// Edit applied to a record's payload by the update flow.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PayloadPatch {
    /// Leave the payload untouched.
    #[default]
    Keep,
    /// Set every given field; a `null` value removes the field.
    Merge(Payload),
    /// Replace the whole payload.
    Replace(Payload),
}

impl PayloadPatch {
    /// Applies the patch and returns true if the payload changed.
    pub fn apply(&self, payload: &mut Payload) -> bool {
        match self {
            Self::Keep => false,
            Self::Merge(fields) => {
                let mut changed = false;
                for (key, value) in fields {
                    if value.is_null() {
                        changed |= payload.remove(key).is_some();
                    } else if payload.get(key) != Some(value) {
                        payload.insert(key.clone(), value.clone());
                        changed = true;
                    }
                }
                changed
            }
            Self::Replace(fields) => {
                if payload == fields {
                    return false;
                }
                *payload = fields.clone();
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn merge_sets_and_removes_fields() {
        let mut current = payload(json!({"name": "Ada", "photo": "ada.jpg"}));
        let patch = PayloadPatch::Merge(payload(json!({"name": "Ada L.", "photo": null})));

        assert!(patch.apply(&mut current));
        assert_eq!(current, payload(json!({"name": "Ada L."})));
    }

    #[test]
    fn merge_with_same_values_is_unchanged() {
        let mut current = payload(json!({"name": "Ada"}));
        let patch = PayloadPatch::Merge(payload(json!({"name": "Ada", "gone": null})));
        assert!(!patch.apply(&mut current));
    }

    #[test]
    fn replace_and_keep() {
        let mut current = payload(json!({"a": 1}));
        assert!(!PayloadPatch::Keep.apply(&mut current));
        assert!(PayloadPatch::Replace(payload(json!({"b": 2}))).apply(&mut current));
        assert_eq!(current, payload(json!({"b": 2})));
    }

    #[test]
    fn at_order_keeps_identity() {
        let record = OrderedRecord::new(RecordId::new(), 3, Payload::new());
        let moved = record.at_order(1);
        assert_eq!(moved.id, record.id);
        assert_eq!(moved.order, 1);
    }
}
