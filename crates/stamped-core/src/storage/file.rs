//! File-backed key-value store
//!
//! Each key is stored as `{key}.value` in a single directory. Writes are
//! atomic (write to temp file, then rename) so a crash never leaves a
//! half-written document behind.
//!
//! Storage location: `~/.local/share/stamped/documents/` (configurable via
//! `Config`)

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::{entry_cost, EntryInfo, KeyValueStore, StorageError, StorageResult};
use crate::config::Config;

/// Extension of stored values
const VALUE_EXTENSION: &str = "value";

/// Key-value store backed by a directory of files
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<u64>,
}

impl FileStore {
    /// Open (creating if needed) a store in `dir`
    pub fn open(dir: impl Into<PathBuf>, quota: Option<u64>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDirectory {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, quota })
    }

    /// Open the store configured for this installation
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        Self::open(config.documents_dir(), config.storage_quota_bytes)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, VALUE_EXTENSION)))
    }

    /// Bytes used by every stored entry except `skip_key`
    fn used_bytes_excluding(&self, skip_key: &str) -> StorageResult<u64> {
        Ok(self
            .entries()?
            .iter()
            .filter(|e| e.key != skip_key)
            .map(|e| entry_cost(&e.key, e.size))
            .sum())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::ReadError { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.value_path(key)?;

        if let Some(quota) = self.quota {
            let needed = self.used_bytes_excluding(key)? + entry_cost(key, value.len() as u64);
            if needed > quota {
                return Err(StorageError::CapacityExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        atomic_write(&path, value.as_bytes())?;
        tracing::debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }

    fn entries(&self) -> StorageResult<Vec<EntryInfo>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|source| StorageError::ReadError {
            path: self.dir.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let metadata = entry.metadata()?;
            entries.push(EntryInfo {
                key: key.to_string(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

/// Reject keys that would escape the store directory or hide as dotfiles
fn validate_key(key: &str) -> StorageResult<()> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\'])
        || key.chars().any(char::is_control);
    if bad {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Appending keeps the temp name unique per key and outside the value extension
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    if let Err(e) = file.write_all(data).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(StorageError::from_io(e, temp_path));
    }

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_absent_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path(), None).unwrap();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path(), None).unwrap();

        store.set("doc", "[[\"a\"]]").unwrap();
        assert_eq!(store.get("doc").unwrap().as_deref(), Some("[[\"a\"]]"));

        store.set("doc", "replaced").unwrap();
        assert_eq!(store.get("doc").unwrap().as_deref(), Some("replaced"));
        assert!(temp_dir.path().join("doc.value").exists());
        assert!(!temp_dir.path().join("doc.value.tmp").exists());
    }

    #[test]
    fn test_values_persist_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileStore::open(temp_dir.path(), None).unwrap();
            store.set("doc", "kept").unwrap();
        }
        let store = FileStore::open(temp_dir.path(), None).unwrap();
        assert_eq!(store.get("doc").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_open_creates_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b");
        let store = FileStore::open(&dir, None).unwrap();
        assert!(store.dir().exists());
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path(), None).unwrap();

        store.set("doc", "x").unwrap();
        store.remove("doc").unwrap();
        assert!(store.get("doc").unwrap().is_none());
        // Removing again is fine
        store.remove("doc").unwrap();
    }

    #[test]
    fn test_entries_skip_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path(), None).unwrap();

        store.set("b", "22").unwrap();
        store.set("a", "1").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let entries = store.entries().unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(entries[1].size, 2);
        assert!(entries[0].modified.is_some());
    }

    #[test]
    fn test_invalid_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path(), None).unwrap();

        for key in ["", "../escape", "a/b", ".hidden"] {
            let err = store.set(key, "x").unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey { .. }), "key {:?}", key);
        }
    }

    #[test]
    fn test_quota() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path(), Some(20)).unwrap();

        store.set("one", "1234567890").unwrap();
        let err = store.set("two", "1234567890").unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert!(store.get("two").unwrap().is_none());

        // Rewriting an existing key only counts its new size
        store.set("one", "0987654321").unwrap();
    }
}
