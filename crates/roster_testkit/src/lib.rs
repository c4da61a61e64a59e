//! # RosterDB Testkit
//!
//! Test utilities for RosterDB.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - A reference model of dense ordering to check the engine against
//! - Property-based test generators using proptest
//! - Stress testing utilities for concurrent writers
//!
//! ## Usage
//!
//! ```rust
//! use roster_testkit::prelude::*;
//! use roster_core::{Payload, RequestedPosition};
//!
//! with_temp_roster(|models| {
//!     models.create(RequestedPosition::absent(), Payload::new()).unwrap();
//!     assert_dense(models);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
