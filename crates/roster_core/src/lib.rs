//! # RosterDB Core
//!
//! Keeps collections of records in a dense, gap-free display order
//! (`1..=N`, each value once) while clients insert at arbitrary
//! positions, reorder and delete.
//!
//! This crate provides:
//! - A transactional ordered store with snapshot reads and a durable
//!   commit journal ([`Store`], [`WriteTransaction`], [`OrderedTxn`])
//! - The position engine: insert-position resolution, range shifting,
//!   quarantine-and-shift moves and post-delete compaction ([`engine`])
//! - A transaction coordinator that makes every mutation atomic
//!   ([`TransactionCoordinator`])
//! - The create / update / delete flows over one collection ([`Roster`])
//!
//! ```rust
//! use roster_core::{CollectionSpec, Payload, RequestedPosition, Roster, Store};
//! use std::sync::Arc;
//!
//! let store = Arc::new(Store::open_in_memory().unwrap());
//! let models = Roster::open(Arc::clone(&store), CollectionSpec::new("models")).unwrap();
//!
//! let a = models.create(RequestedPosition::absent(), Payload::new()).unwrap();
//! let b = models.create(RequestedPosition::at(1), Payload::new()).unwrap();
//! assert_eq!(b.order, 1);
//! assert_eq!(models.get(a.id).unwrap().unwrap().order, 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod engine;
mod error;
mod record;
mod roster;
pub mod store;
mod types;
mod verify;

pub use config::{ConcurrencyMode, Config, ShiftMode};
pub use engine::{
    resolve_insert_position, InsertPosition, MoveOutcome, Mutation, RequestedPosition,
    TransactionCoordinator,
};
pub use error::{CoreError, CoreResult};
pub use record::{OrderedRecord, Payload, PayloadPatch, RecordId, ORDER_FIELD};
pub use roster::{CleanupError, CleanupHook, CleanupReason, Roster};
pub use store::{
    CollectionSpec, OrderFilter, OrderedTxn, SortDirection, Store, WriteTransaction,
};
pub use types::{CollectionId, SequenceNumber, TransactionId};
pub use verify::{check_density, DensityViolation};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
