//! Per-collection record storage and unique indexes.

use crate::error::{CoreError, CoreResult};
use crate::record::{OrderedRecord, RecordId, ORDER_FIELD};
use crate::store::adapter::{OrderFilter, SortDirection};
use crate::types::SequenceNumber;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Declaration of an ordered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Unique collection name.
    pub name: String,
    /// Payload fields whose values must be unique across the collection.
    /// Records without the field (or with `null`) are not constrained.
    pub unique_fields: Vec<String>,
}

impl CollectionSpec {
    /// Declares a collection with no unique payload fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique_fields: Vec::new(),
        }
    }

    /// Adds a unique payload field.
    #[must_use]
    pub fn unique(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.unique_fields.contains(&field) {
            self.unique_fields.push(field);
        }
        self
    }
}

/// A unique-index key: the JSON encoding of the value, plus the display
/// form used in errors.
struct UniqueKey<'a> {
    field: &'a str,
    key: String,
    display: String,
}

/// Records of one collection with their order and unique indexes.
///
/// Cloned into a transaction's working set on first write; the clone is
/// published as a whole on commit.
#[derive(Debug, Clone)]
pub(crate) struct CollectionData {
    spec: CollectionSpec,
    records: HashMap<RecordId, OrderedRecord>,
    by_order: BTreeMap<u32, RecordId>,
    unique: HashMap<String, HashMap<String, RecordId>>,
    last_commit: SequenceNumber,
}

impl CollectionData {
    pub(crate) fn new(spec: CollectionSpec, created_at: SequenceNumber) -> Self {
        let unique = spec
            .unique_fields
            .iter()
            .map(|field| (field.clone(), HashMap::new()))
            .collect();
        Self {
            spec,
            records: HashMap::new(),
            by_order: BTreeMap::new(),
            unique,
            last_commit: created_at,
        }
    }

    pub(crate) fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    pub(crate) fn name(&self) -> &str {
        &self.spec.name
    }

    pub(crate) fn last_commit(&self) -> SequenceNumber {
        self.last_commit
    }

    pub(crate) fn set_last_commit(&mut self, seq: SequenceNumber) {
        self.last_commit = seq;
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn get(&self, id: RecordId) -> Option<&OrderedRecord> {
        self.records.get(&id)
    }

    pub(crate) fn max_order(&self) -> u32 {
        self.by_order.keys().next_back().copied().unwrap_or(0)
    }

    pub(crate) fn scan(&self, filter: OrderFilter, sort: SortDirection) -> Vec<OrderedRecord> {
        let min = filter.min.unwrap_or(0);
        let max = filter.max.unwrap_or(u32::MAX);
        if min > max {
            return Vec::new();
        }

        let range = self.by_order.range(min..=max);
        let ids: Vec<&RecordId> = match sort {
            SortDirection::Ascending => range.map(|(_, id)| id).collect(),
            SortDirection::Descending => range.rev().map(|(_, id)| id).collect(),
        };
        ids.into_iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }

    /// Writes one record, enforcing every unique index against the
    /// current contents.
    pub(crate) fn put(&mut self, record: OrderedRecord) -> CoreResult<()> {
        self.check_order_value(&record)?;
        if let Some(owner) = self.by_order.get(&record.order) {
            if *owner != record.id {
                return Err(self.violation(ORDER_FIELD, record.order.to_string()));
            }
        }
        for key in self.unique_keys(&record) {
            let owner = self.unique.get(key.field).and_then(|index| index.get(&key.key));
            if owner.is_some_and(|owner| *owner != record.id) {
                return Err(self.violation(key.field, key.display));
            }
        }

        self.unlink(record.id);
        self.link(record);
        Ok(())
    }

    /// Writes a batch of records, checking the unique indexes against
    /// the state after the whole batch is applied.
    pub(crate) fn put_many(&mut self, records: Vec<OrderedRecord>) -> CoreResult<()> {
        let mut batch_ids = HashSet::with_capacity(records.len());
        for record in &records {
            self.check_order_value(record)?;
            if !batch_ids.insert(record.id) {
                return Err(CoreError::invalid_operation(format!(
                    "record {} written twice in one batch",
                    record.id
                )));
            }
        }

        let mut claimed_orders = HashSet::with_capacity(records.len());
        let mut claimed_keys = HashSet::new();
        for record in &records {
            let held_elsewhere = self
                .by_order
                .get(&record.order)
                .is_some_and(|owner| !batch_ids.contains(owner));
            if !claimed_orders.insert(record.order) || held_elsewhere {
                return Err(self.violation(ORDER_FIELD, record.order.to_string()));
            }
            for key in self.unique_keys(record) {
                let held_elsewhere = self
                    .unique
                    .get(key.field)
                    .and_then(|index| index.get(&key.key))
                    .is_some_and(|owner| !batch_ids.contains(owner));
                if !claimed_keys.insert((key.field.to_owned(), key.key)) || held_elsewhere {
                    return Err(self.violation(key.field, key.display));
                }
            }
        }

        for record in &records {
            self.unlink(record.id);
        }
        for record in records {
            self.link(record);
        }
        Ok(())
    }

    pub(crate) fn delete(&mut self, id: RecordId) -> Option<OrderedRecord> {
        self.unlink(id)
    }

    /// Iterates records in ascending order.
    pub(crate) fn iter_ordered(&self) -> impl Iterator<Item = &OrderedRecord> {
        self.by_order
            .values()
            .filter_map(move |id| self.records.get(id))
    }

    fn check_order_value(&self, record: &OrderedRecord) -> CoreResult<()> {
        if record.order == 0 {
            return Err(CoreError::invalid_operation(format!(
                "order values in {} start at 1",
                self.name()
            )));
        }
        Ok(())
    }

    fn violation(&self, field: &str, value: String) -> CoreError {
        CoreError::constraint_violation(self.name(), field, value)
    }

    fn unique_keys<'a>(&'a self, record: &OrderedRecord) -> Vec<UniqueKey<'a>> {
        self.spec
            .unique_fields
            .iter()
            .filter_map(|field| {
                let value = record.payload.get(field).filter(|v| !v.is_null())?;
                let display = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some(UniqueKey {
                    field: field.as_str(),
                    key: value.to_string(),
                    display,
                })
            })
            .collect()
    }

    fn unlink(&mut self, id: RecordId) -> Option<OrderedRecord> {
        let previous = self.records.remove(&id)?;
        if self.by_order.get(&previous.order) == Some(&id) {
            self.by_order.remove(&previous.order);
        }
        let keys: Vec<(String, String)> = self
            .unique_keys(&previous)
            .into_iter()
            .map(|key| (key.field.to_owned(), key.key))
            .collect();
        for (field, key) in keys {
            if let Some(index) = self.unique.get_mut(&field) {
                if index.get(&key) == Some(&id) {
                    index.remove(&key);
                }
            }
        }
        Some(previous)
    }

    fn link(&mut self, record: OrderedRecord) {
        let keys: Vec<(String, String)> = self
            .unique_keys(&record)
            .into_iter()
            .map(|key| (key.field.to_owned(), key.key))
            .collect();
        for (field, key) in keys {
            self.unique.entry(field).or_default().insert(key, record.id);
        }
        self.by_order.insert(record.order, record.id);
        self.records.insert(record.id, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Payload;
    use serde_json::json;

    fn collection() -> CollectionData {
        CollectionData::new(
            CollectionSpec::new("models").unique("slug"),
            SequenceNumber::default(),
        )
    }

    fn record(order: u32, slug: Option<&str>) -> OrderedRecord {
        let mut payload = Payload::new();
        if let Some(slug) = slug {
            payload.insert("slug".into(), json!(slug));
        }
        OrderedRecord::new(RecordId::new(), order, payload)
    }

    #[test]
    fn put_rejects_taken_order() {
        let mut data = collection();
        data.put(record(1, None)).unwrap();

        let err = data.put(record(1, None)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConstraintViolation { ref field, .. } if field == ORDER_FIELD
        ));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn put_rejects_zero_order() {
        let mut data = collection();
        assert!(matches!(
            data.put(record(0, None)),
            Err(CoreError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn put_rejects_duplicate_unique_field() {
        let mut data = collection();
        data.put(record(1, Some("ada"))).unwrap();

        let err = data.put(record(2, Some("ada"))).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConstraintViolation { ref field, ref value, .. }
                if field == "slug" && value == "ada"
        ));
        // Records without the field are unconstrained.
        data.put(record(2, None)).unwrap();
        data.put(record(3, None)).unwrap();
    }

    #[test]
    fn rewriting_a_record_moves_its_index_entries() {
        let mut data = collection();
        let first = record(1, Some("ada"));
        data.put(first.clone()).unwrap();

        let mut renamed = first.at_order(2);
        renamed.payload.insert("slug".into(), json!("grace"));
        data.put(renamed).unwrap();

        assert_eq!(data.max_order(), 2);
        data.put(record(1, Some("ada"))).unwrap();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn put_many_allows_swapping_orders() {
        let mut data = collection();
        let a = record(1, None);
        let b = record(2, None);
        data.put(a.clone()).unwrap();
        data.put(b.clone()).unwrap();

        data.put_many(vec![a.at_order(2), b.at_order(1)]).unwrap();

        let ids: Vec<RecordId> = data.iter_ordered().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn put_many_rejects_order_held_outside_batch() {
        let mut data = collection();
        let a = record(1, None);
        let b = record(2, None);
        data.put(a.clone()).unwrap();
        data.put(b).unwrap();

        assert!(data.put_many(vec![a.at_order(2)]).is_err());
        assert_eq!(data.get(a.id).unwrap().order, 1);
    }

    #[test]
    fn scan_respects_filter_and_direction() {
        let mut data = collection();
        for order in 1..=5 {
            data.put(record(order, None)).unwrap();
        }

        let down: Vec<u32> = data
            .scan(OrderFilter::between(2, 4), SortDirection::Descending)
            .iter()
            .map(|r| r.order)
            .collect();
        assert_eq!(down, vec![4, 3, 2]);
        assert!(data
            .scan(OrderFilter::between(4, 2), SortDirection::Ascending)
            .is_empty());
    }

    #[test]
    fn delete_frees_order_and_unique_value() {
        let mut data = collection();
        let a = record(1, Some("ada"));
        data.put(a.clone()).unwrap();

        assert_eq!(data.delete(a.id).unwrap().id, a.id);
        assert!(data.delete(a.id).is_none());
        data.put(record(1, Some("ada"))).unwrap();
    }
}
