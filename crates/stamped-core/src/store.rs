//! Document storage interface
//!
//! `DocumentStore` sits on top of a [`KeyValueStore`] and speaks in
//! snapshots instead of strings:
//!
//! - an absent key loads as a fresh, empty document
//! - a value that fails to decode loads as an empty document too; the bad
//!   value is copied to `{id}.corrupt` first so it can be recovered by hand
//! - the stored value decides whether a document is a grid or text; the
//!   configured kind only applies to fresh documents and ambiguous values
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = DocumentStore::new(FileStore::from_config(&config)?, config.document_kind);
//! let loaded = store.load(id)?;
//! store.save(&loaded.snapshot)?;
//! ```

use chrono::{DateTime, Utc};

use crate::document::{DocumentId, DocumentKind, DocumentSnapshot};
use crate::storage::{KeyValueStore, StorageResult};

/// Suffix for keys holding undecodable values
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// Where a loaded snapshot came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Decoded from storage
    Stored,
    /// Nothing stored under the key yet
    Fresh,
    /// Stored value was unreadable and has been set aside
    Recovered { details: String },
}

/// Result of loading a document
#[derive(Debug, Clone)]
pub struct Loaded {
    pub snapshot: DocumentSnapshot,
    pub origin: LoadOrigin,
}

/// Summary of a stored document, for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub id: DocumentId,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Snapshot-level access to a key-value store
pub struct DocumentStore<S> {
    backend: S,
    kind: DocumentKind,
}

impl<S: KeyValueStore> DocumentStore<S> {
    pub fn new(backend: S, kind: DocumentKind) -> Self {
        Self { backend, kind }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Load a document, falling back to an empty one if absent or unreadable
    pub fn load(&mut self, id: DocumentId) -> StorageResult<Loaded> {
        let Some(value) = self.backend.get(&id.key())? else {
            tracing::debug!(%id, "No stored document, starting fresh");
            return Ok(Loaded {
                snapshot: DocumentSnapshot::empty(id, self.kind),
                origin: LoadOrigin::Fresh,
            });
        };

        match DocumentSnapshot::decode(id, self.kind, &value) {
            Ok(snapshot) => Ok(Loaded {
                snapshot,
                origin: LoadOrigin::Stored,
            }),
            Err(e) => {
                let details = e.to_string();
                tracing::warn!(%id, error = %details, "Stored document is unreadable, starting empty");
                let backup_key = format!("{}{}", id.key(), CORRUPT_SUFFIX);
                if let Err(e) = self.backend.set(&backup_key, &value) {
                    tracing::warn!(%id, error = %e, "Could not back up unreadable document");
                }
                Ok(Loaded {
                    snapshot: DocumentSnapshot::empty(id, self.kind),
                    origin: LoadOrigin::Recovered { details },
                })
            }
        }
    }

    /// Persist a snapshot under its identifier
    pub fn save(&mut self, snapshot: &DocumentSnapshot) -> StorageResult<()> {
        let value = snapshot.encode()?;
        self.backend.set(&snapshot.id.key(), &value)?;
        tracing::debug!(id = %snapshot.id, bytes = value.len(), "Saved document");
        Ok(())
    }

    /// Check whether anything is stored for `id`
    pub fn exists(&self, id: DocumentId) -> StorageResult<bool> {
        Ok(self.backend.get(&id.key())?.is_some())
    }

    /// Delete a stored document and any set-aside copy
    pub fn delete(&mut self, id: DocumentId) -> StorageResult<()> {
        self.backend.remove(&id.key())?;
        self.backend
            .remove(&format!("{}{}", id.key(), CORRUPT_SUFFIX))
    }

    /// Stored documents, most recently modified first
    pub fn list(&self) -> StorageResult<Vec<DocumentEntry>> {
        let mut docs: Vec<DocumentEntry> = self
            .backend
            .entries()?
            .into_iter()
            .filter_map(|entry| {
                let id = entry.key.parse().ok()?;
                Some(DocumentEntry {
                    id,
                    size: entry.size,
                    modified: entry.modified,
                })
            })
            .collect();

        docs.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Content, Grid};
    use crate::storage::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn memory_store() -> DocumentStore<MemoryStore> {
        DocumentStore::new(MemoryStore::new(), DocumentKind::Grid)
    }

    #[test]
    fn test_absent_document_loads_empty() {
        let mut store = memory_store();
        let id = DocumentId::new();

        let loaded = store.load(id).unwrap();
        assert_eq!(loaded.origin, LoadOrigin::Fresh);
        assert_eq!(loaded.snapshot, DocumentSnapshot::empty(id, DocumentKind::Grid));
        // Loading does not write anything
        assert!(!store.exists(id).unwrap());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut store = memory_store();
        let id = DocumentId::new();
        let mut grid = Grid::default();
        grid.set_cell(2, 4, "Hello. [00:00:12] ");
        let snapshot = DocumentSnapshot {
            id,
            content: Content::Grid(grid),
        };

        store.save(&snapshot).unwrap();
        let loaded = store.load(id).unwrap();
        assert_eq!(loaded.origin, LoadOrigin::Stored);
        assert_eq!(loaded.snapshot, snapshot);
    }

    #[test]
    fn test_corrupt_document_is_set_aside() {
        let mut store = memory_store();
        let id = DocumentId::new();
        store.backend_mut().set(&id.key(), "{{garbage").unwrap();

        let loaded = store.load(id).unwrap();
        assert!(matches!(loaded.origin, LoadOrigin::Recovered { .. }));
        assert!(loaded.snapshot.content.is_blank());

        let backup = store
            .backend()
            .get(&format!("{}{}", id.key(), CORRUPT_SUFFIX))
            .unwrap();
        assert_eq!(backup.as_deref(), Some("{{garbage"));

        // Backups never show up as documents
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![id]);
    }

    #[test]
    fn test_text_kind() {
        let mut store = DocumentStore::new(MemoryStore::new(), DocumentKind::Text);
        let id = DocumentId::new();
        let snapshot = DocumentSnapshot {
            id,
            content: Content::Text("notes. [00:00:01] ".to_string()),
        };

        store.save(&snapshot).unwrap();
        assert_eq!(
            store.backend().get(&id.key()).unwrap().as_deref(),
            Some("notes. [00:00:01] ")
        );
        assert_eq!(store.load(id).unwrap().snapshot, snapshot);
    }

    #[test]
    fn test_stored_grid_loads_under_text_config() {
        let mut store = DocumentStore::new(MemoryStore::new(), DocumentKind::Text);
        let id = DocumentId::new();
        let mut grid = Grid::default();
        grid.set_cell(2, 1, "cue. [00:00:07] ");
        let snapshot = DocumentSnapshot {
            id,
            content: Content::Grid(grid),
        };

        store.save(&snapshot).unwrap();
        let loaded = store.load(id).unwrap();
        assert_eq!(loaded.origin, LoadOrigin::Stored);
        assert_eq!(loaded.snapshot.kind(), DocumentKind::Grid);
        assert_eq!(loaded.snapshot, snapshot);
    }

    #[test]
    fn test_save_surfaces_capacity_error() {
        let mut store = DocumentStore::new(MemoryStore::with_quota(64), DocumentKind::Grid);
        let snapshot = DocumentSnapshot::empty(DocumentId::new(), DocumentKind::Grid);

        let err = store.save(&snapshot).unwrap_err();
        assert!(err.is_capacity_exceeded());
    }

    #[test]
    fn test_delete() {
        let mut store = memory_store();
        let id = DocumentId::new();
        store
            .save(&DocumentSnapshot::empty(id, DocumentKind::Grid))
            .unwrap();
        assert!(store.exists(id).unwrap());

        store.delete(id).unwrap();
        assert!(!store.exists(id).unwrap());
    }

    #[test]
    fn test_list_with_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileStore::open(temp_dir.path(), None).unwrap();
        let mut store = DocumentStore::new(backend, DocumentKind::Grid);

        let first = DocumentId::new();
        let second = DocumentId::new();
        store
            .save(&DocumentSnapshot::empty(first, DocumentKind::Grid))
            .unwrap();
        store
            .save(&DocumentSnapshot::empty(second, DocumentKind::Grid))
            .unwrap();

        let docs = store.list().unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().any(|d| d.id == first));
        assert!(docs.iter().all(|d| d.size > 0));
    }
}
