//! File-backed journal storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Suffix of the scratch file used by [`StorageBackend::replace`].
const REPLACE_SUFFIX: &str = "tmp";

/// A journal backend stored in a single file.
///
/// `flush` hands data to the OS, `sync` calls `File::sync_all`.
/// `replace` writes a sibling scratch file, syncs it, renames it over
/// the journal and syncs the directory, so a crash leaves either the old
/// or the new journal. The scratch file's handle becomes the journal
/// handle, so nothing is reopened after the rename.
///
/// ```no_run
/// use roster_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let mut journal = FileBackend::open(Path::new("journal.log")).unwrap();
/// journal.append(b"frame").unwrap();
/// journal.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: RwLock<File>,
    size: RwLock<u64>,
}

impl FileBackend {
    /// Opens the journal file, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = Self::open_file(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size: RwLock::new(size),
        })
    }

    /// Opens the journal file, creating parent directories first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories or the file cannot be created.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_file(path: &Path) -> StorageResult<File> {
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?)
    }

    fn scratch_path(&self) -> PathBuf {
        self.path.with_extension(REPLACE_SUFFIX)
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.size.read();
        let end = offset.saturating_add(len as u64);

        if end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let mut file = self.file.write();
        let mut size = self.size.write();
        let offset = *size;

        if data.is_empty() {
            return Ok(offset);
        }

        file.seek(SeekFrom::End(0))?;
        if let Err(err) = file.write_all(data) {
            // Drop whatever part of a short write landed; callers that
            // need a guarantee cut back with `truncate`.
            let _ = file.set_len(offset);
            return Err(err.into());
        }
        *size += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.write().flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.write().sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let file = self.file.write();
        let mut size = self.size.write();

        if new_size > *size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size: *size,
            });
        }

        file.set_len(new_size)?;
        *size = new_size;
        file.sync_all()?;
        Ok(())
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        let scratch = self.scratch_path();
        let mut fresh = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&scratch)?;
        fresh.write_all(data)?;
        fresh.sync_all()?;

        // The handle follows the inode through the rename, so once the
        // rename succeeds `fresh` is the journal.
        {
            let mut file = self.file.write();
            let mut size = self.size.write();
            fs::rename(&scratch, &self.path)?;
            *file = fresh;
            *size = data.len() as u64;
        }

        sync_parent_dir(&self.path)
    }
}

/// Makes a rename inside the journal's directory durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> StorageResult<()> {
    // NTFS journals directory metadata itself.
    Ok(())
}
