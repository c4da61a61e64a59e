//! Ordered records and their identifiers.

mod id;
mod ordered;

pub use id::RecordId;
pub use ordered::{OrderedRecord, Payload, PayloadPatch, ORDER_FIELD};
