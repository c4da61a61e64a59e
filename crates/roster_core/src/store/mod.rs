//! The ordered store.
//!
//! A [`Store`] holds any number of ordered collections. All writes go
//! through a [`WriteTransaction`]:
//! - **Atomicity**: a transaction is published whole on commit or not at all
//! - **Isolation**: readers see the last committed snapshot, never a
//!   half-applied shift
//! - **Durability**: every commit is framed into the journal before it
//!   becomes visible
//!
//! The engine talks to the store only through the [`OrderedTxn`] seam.

mod adapter;
mod collection;
mod dir;
#[cfg(test)]
pub(crate) mod faults;
mod journal;
mod manager;
mod transaction;

pub use adapter::{OrderFilter, OrderedTxn, SortDirection};
pub use collection::CollectionSpec;
pub use dir::StoreDir;
pub use manager::Store;
pub use transaction::{TransactionState, WriteTransaction};
