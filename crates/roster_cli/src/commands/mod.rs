//! CLI command implementations.

pub mod checkpoint;
pub mod delete;
pub mod insert;
pub mod list;
pub mod update;
pub mod verify;

use roster_core::{CollectionSpec, OrderedRecord, Payload, Roster, Store};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Collection the command operates on.
pub struct Target {
    /// Collection name.
    pub collection: String,
    /// Unique payload fields declared for it.
    pub unique: Vec<String>,
}

impl Target {
    fn spec(&self) -> CollectionSpec {
        self.unique
            .iter()
            .fold(CollectionSpec::new(self.collection.as_str()), |spec, field| {
                spec.unique(field.as_str())
            })
    }
}

/// Opens the store at `path` and the target collection in it.
pub fn open_roster(path: &Path, target: &Target) -> Result<Roster, Box<dyn std::error::Error>> {
    debug!(path = %path.display(), collection = %target.collection, "opening roster");
    let store = Arc::new(Store::open(path)?);
    Ok(Roster::open(store, target.spec())?)
}

/// Parses `key=value` arguments into a payload.
///
/// Values that parse as JSON keep their type (`height=180`,
/// `active=true`, `slug=null`); anything else is a string.
pub fn parse_fields(fields: &[String]) -> Result<Payload, Box<dyn std::error::Error>> {
    let mut payload = Payload::new();
    for field in fields {
        let (key, raw) = field
            .split_once('=')
            .ok_or_else(|| format!("Expected key=value, got {field:?}"))?;
        if key.is_empty() {
            return Err(format!("Empty field name in {field:?}").into());
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
        payload.insert(key.to_owned(), value);
    }
    Ok(payload)
}

/// One-line text form of a record.
pub fn describe(record: &OrderedRecord) -> String {
    format!(
        "{:>4}  {}  {}",
        record.order,
        record.id,
        Value::Object(record.payload.clone())
    )
}
