//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use roster_core::{CollectionSpec, Config, Roster, Store};
use roster_storage::InMemoryBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Name of the collection the fixtures open.
pub const TEST_COLLECTION: &str = "models";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Arc<Store>,
    /// Handle on the journal of an in-memory store.
    probe: Option<InMemoryBackend>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self::memory_with_config(Config::default())
    }

    /// Creates a new in-memory test store with a custom configuration.
    pub fn memory_with_config(config: Config) -> Self {
        let probe = InMemoryBackend::new();
        let store = Store::open_with_backend(config, Box::new(probe.clone()))
            .expect("Failed to open in-memory store");
        Self {
            store: Arc::new(store),
            probe: Some(probe),
            _temp_dir: None,
        }
    }

    /// Creates a new file-based test store.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Creates a new file-based test store with a custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open_with_config(&temp_dir.path().join("store"), config)
            .expect("Failed to open file store");
        Self {
            store: Arc::new(store),
            probe: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().join("store"))
    }

    /// Returns the journal handle of an in-memory store.
    ///
    /// Use it to inspect journal bytes or to make the store unavailable.
    pub fn probe(&self) -> Option<&InMemoryBackend> {
        self.probe.as_ref()
    }

    /// Opens the test collection.
    pub fn roster(&self) -> Roster {
        self.roster_with(CollectionSpec::new(TEST_COLLECTION))
    }

    /// Opens a collection with a custom declaration.
    pub fn roster_with(&self, spec: CollectionSpec) -> Roster {
        Roster::open(Arc::clone(&self.store), spec).expect("Failed to open roster")
    }

    /// Drops the store and opens it again from its journal.
    ///
    /// Panics if a roster opened from this fixture is still alive.
    pub fn reopen(self) -> Self {
        let config = self.store.config().clone();
        let Self {
            store,
            probe,
            _temp_dir: temp_dir,
        } = self;
        drop(
            Arc::try_unwrap(store).expect("Store still shared; drop every roster before reopening"),
        );

        let store = match (&probe, &temp_dir) {
            (Some(probe), _) => Store::open_with_backend(config, Box::new(probe.clone())),
            (None, Some(dir)) => Store::open_with_config(&dir.path().join("store"), config),
            (None, None) => unreachable!("fixture is either in-memory or file-based"),
        }
        .expect("Failed to reopen store");

        Self {
            store: Arc::new(store),
            probe,
            _temp_dir: temp_dir,
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with the test collection of a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use roster_core::{Payload, RequestedPosition};
/// use roster_testkit::with_temp_roster;
///
/// with_temp_roster(|models| {
///     let record = models.create(RequestedPosition::absent(), Payload::new()).unwrap();
///     assert_eq!(record.order, 1);
/// });
/// ```
pub fn with_temp_roster<F, R>(f: F) -> R
where
    F: FnOnce(&Roster) -> R,
{
    let test_store = TestStore::memory();
    let roster = test_store.roster();
    f(&roster)
}

/// Runs a test with the test collection of a temporary file-based store.
pub fn with_file_roster<F, R>(f: F) -> R
where
    F: FnOnce(&Roster, &Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store.path().expect("File store should have a path");
    let roster = test_store.roster();
    f(&roster, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use roster_core::{OrderedRecord, Payload, RequestedPosition};
    use serde_json::json;

    /// Payload with a `name` and a lowercase `slug`.
    pub fn named(name: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert("name".into(), json!(name));
        payload.insert("slug".into(), json!(name.to_lowercase()));
        payload
    }

    /// Appends one record per name, in order.
    pub fn append_named(roster: &Roster, names: &[&str]) -> Vec<OrderedRecord> {
        names
            .iter()
            .map(|name| {
                roster
                    .create(RequestedPosition::absent(), named(name))
                    .expect("Failed to append record")
            })
            .collect()
    }

    /// Names of the collection's records in ascending order.
    pub fn names_in_order(roster: &Roster) -> Vec<String> {
        roster
            .list()
            .expect("Failed to list roster")
            .iter()
            .map(|record| {
                record
                    .payload
                    .get("name")
                    .and_then(|name| name.as_str())
                    .unwrap_or_default()
                    .to_owned()
            })
            .collect()
    }

    /// A store whose test collection holds `count` appended records named
    /// `r1`, `r2`, ... with `slug` declared unique.
    pub fn populated_store(count: usize) -> (TestStore, Roster) {
        let test_store = TestStore::memory();
        let roster = test_store.roster_with(CollectionSpec::new(TEST_COLLECTION).unique("slug"));
        let names: Vec<String> = (1..=count).map(|i| format!("r{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        append_named(&roster, &refs);
        (test_store, roster)
    }
}

#[cfg(test)]
mod tests {
    use super::scenarios::*;
    use super::*;
    use roster_core::{PayloadPatch, RequestedPosition};

    #[test]
    fn memory_fixture_survives_reopen() {
        let test_store = TestStore::memory();
        {
            let roster = test_store.roster();
            append_named(&roster, &["A", "B"]);
        }
        let test_store = test_store.reopen();
        assert_eq!(names_in_order(&test_store.roster()), vec!["A", "B"]);
    }

    #[test]
    fn file_fixture_survives_reopen() {
        let test_store = TestStore::file();
        assert!(test_store.path().is_some());
        {
            let roster = test_store.roster();
            let records = append_named(&roster, &["A", "B", "C"]);
            roster
                .update(records[2].id, RequestedPosition::at(1), PayloadPatch::Keep)
                .unwrap();
        }
        let test_store = test_store.reopen();
        assert_eq!(names_in_order(&test_store.roster()), vec!["C", "A", "B"]);
    }

    #[test]
    fn file_roster_helper_provides_path() {
        with_file_roster(|roster, path| {
            append_named(roster, &["A"]);
            assert!(path.join("journal.log").exists());
        });
    }

    #[test]
    fn populated_store_is_dense() {
        let (_store, roster) = populated_store(10);
        assert_eq!(roster.len().unwrap(), 10);
        assert!(roster.verify().unwrap().is_empty());
    }
}
