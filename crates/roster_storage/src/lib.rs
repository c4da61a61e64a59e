//! # RosterDB Storage
//!
//! Byte-level backends that hold the RosterDB commit journal.
//!
//! A backend is an append-only byte log. It knows nothing about journal
//! frames, collections or order values; `roster_core` owns every byte
//! it writes here.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - ephemeral stores and tests
//! - [`FileBackend`] - a single file on the local file system
//!
//! ## Example
//!
//! ```rust
//! use roster_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut journal = InMemoryBackend::new();
//! let offset = journal.append(b"frame-1").unwrap();
//! assert_eq!(journal.read_at(offset, 7).unwrap(), b"frame-1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
