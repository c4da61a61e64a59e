//! The position engine.
//!
//! Keeps `order` dense (`1..=N`, each value once) across inserts, moves
//! and deletes:
//! - [`resolve_insert_position`] decides where a new record goes
//! - [`shift_up_from`] makes room at an occupied slot
//! - [`move_to`] repositions an existing record through a quarantine slot
//! - [`compact_after_delete`] closes the gap a delete leaves
//!
//! Every step runs inside a transaction opened by the
//! [`TransactionCoordinator`]; intermediate states are never visible.

mod coordinator;
mod moves;
mod position;
mod shift;

pub use coordinator::{Mutation, TransactionCoordinator};
pub use moves::{move_to, MoveOutcome, QUARANTINE_OFFSET};
pub use position::{resolve_insert_position, InsertPosition, RequestedPosition};
pub use shift::{compact_after_delete, shift_up_from};
