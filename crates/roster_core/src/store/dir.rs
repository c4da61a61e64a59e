//! Store directory management.
//!
//! ```text
//! <store_path>/
//! ├─ LOCK          # Advisory lock, one process per store
//! └─ journal.log   # Commit journal
//! ```

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const JOURNAL_FILE: &str = "journal.log";

/// A locked store directory.
///
/// Holds an exclusive advisory lock on `LOCK` for as long as it lives, so
/// two processes can never append to the same journal.
#[derive(Debug)]
pub struct StoreDir {
    path: PathBuf,
    _lock_file: File,
}

impl StoreDir {
    /// Opens (or creates) a store directory and takes its lock.
    ///
    /// # Errors
    ///
    /// - `InvalidOperation` if the directory is missing and
    ///   `create_if_missing` is false, or the path is not a directory
    /// - `StoreLocked` if another process holds the lock
    /// - I/O errors
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_operation(format!(
                    "store directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_operation(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StoreLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the journal file path.
    #[must_use]
    pub fn journal_path(&self) -> PathBuf {
        self.path.join(JOURNAL_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_missing_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("store");

        let dir = StoreDir::open(&path, true).unwrap();
        assert!(path.join(LOCK_FILE).exists());
        assert_eq!(dir.journal_path(), path.join(JOURNAL_FILE));
    }

    #[test]
    fn refuses_missing_directory_without_create() {
        let temp = tempdir().unwrap();
        let result = StoreDir::open(&temp.path().join("absent"), false);
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn second_open_is_locked_out() {
        let temp = tempdir().unwrap();
        let _held = StoreDir::open(temp.path(), true).unwrap();

        assert!(matches!(
            StoreDir::open(temp.path(), true),
            Err(CoreError::StoreLocked)
        ));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let temp = tempdir().unwrap();
        drop(StoreDir::open(temp.path(), true).unwrap());
        assert!(StoreDir::open(temp.path(), true).is_ok());
    }
}
