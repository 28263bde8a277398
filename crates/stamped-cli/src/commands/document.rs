//! Document command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use stamped_core::analytics::{self, Analytics};
use stamped_core::route::parse_document_ref;
use stamped_core::{export, DocumentId, DocumentStore, KeyValueStore, LoadOrigin};

use crate::output::Output;

/// Resolve a document reference that must already be stored
fn resolve_existing<S: KeyValueStore>(
    store: &DocumentStore<S>,
    reference: &str,
) -> Result<DocumentId> {
    let id = parse_document_ref(reference)?;
    if !store.exists(id).context("Failed to check document")? {
        bail!("No document stored with ID {}", id);
    }
    Ok(id)
}

/// List stored documents
pub fn list<S: KeyValueStore>(store: &DocumentStore<S>, output: &Output) -> Result<()> {
    let docs = store.list().context("Failed to list documents")?;
    output.print_documents(&docs);
    Ok(())
}

/// Show a document's content
pub fn show<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    reference: String,
    output: &Output,
) -> Result<()> {
    let id = resolve_existing(store, &reference)?;
    let loaded = store.load(id).context("Failed to load document")?;
    if let LoadOrigin::Recovered { details } = &loaded.origin {
        eprintln!("⚠ Stored document was unreadable ({}); showing it empty", details);
    }
    output.print_document(&loaded.snapshot);
    Ok(())
}

/// Write `stamped.csv` for a document
pub fn export<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    reference: String,
    out_dir: PathBuf,
    sink: &dyn Analytics,
    output: &Output,
) -> Result<()> {
    let id = resolve_existing(store, &reference)?;
    let loaded = store.load(id).context("Failed to load document")?;
    if let LoadOrigin::Recovered { details } = &loaded.origin {
        bail!(
            "Stored document {} is unreadable ({}); nothing exported",
            id,
            details
        );
    }
    let path = export::write_export(&out_dir, &loaded.snapshot)
        .context("Failed to export document")?;
    sink.event(analytics::EXPORT_DOCUMENT);

    if output.is_json() {
        println!("{}", serde_json::json!({"id": id, "path": path}));
    } else if output.is_quiet() {
        println!("{}", path.display());
    } else {
        output.success(&format!("Exported {} to {}", id, path.display()));
    }
    Ok(())
}

/// Delete a stored document
pub fn delete<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    reference: String,
    output: &Output,
) -> Result<()> {
    let id = resolve_existing(store, &reference)?;
    store.delete(id).context("Failed to delete document")?;
    output.success(&format!("Deleted document {}", id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use stamped_core::analytics::MemoryAnalytics;
    use stamped_core::{DocumentKind, DocumentSnapshot, MemoryStore};
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    fn store_with_doc() -> (DocumentStore<MemoryStore>, DocumentId) {
        let mut store = DocumentStore::new(MemoryStore::new(), DocumentKind::Grid);
        let id = DocumentId::new();
        store
            .save(&DocumentSnapshot::empty(id, DocumentKind::Grid))
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_unknown_document_is_an_error() {
        let (mut store, _) = store_with_doc();
        let missing = DocumentId::new().to_string();
        assert!(show(&mut store, missing.clone(), &quiet()).is_err());
        assert!(delete(&mut store, missing, &quiet()).is_err());
        assert!(show(&mut store, "garbage".to_string(), &quiet()).is_err());
    }

    #[test]
    fn test_export_accepts_route_path() {
        let (mut store, id) = store_with_doc();
        let temp_dir = TempDir::new().unwrap();
        let sink = MemoryAnalytics::new();

        export(
            &mut store,
            format!("/{}", id),
            temp_dir.path().to_path_buf(),
            &sink,
            &quiet(),
        )
        .unwrap();

        assert!(temp_dir.path().join("stamped.csv").exists());
        assert_eq!(sink.events(), vec![analytics::EXPORT_DOCUMENT]);
    }

    #[test]
    fn test_export_refuses_unreadable_document() {
        let (mut store, id) = store_with_doc();
        store.backend_mut().set(&id.key(), "{{garbage").unwrap();
        let temp_dir = TempDir::new().unwrap();
        let sink = MemoryAnalytics::new();

        let err = export(
            &mut store,
            id.to_string(),
            temp_dir.path().to_path_buf(),
            &sink,
            &quiet(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("unreadable"));
        assert!(!temp_dir.path().join("stamped.csv").exists());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_delete() {
        let (mut store, id) = store_with_doc();
        delete(&mut store, id.to_string(), &quiet()).unwrap();
        assert!(!store.exists(id).unwrap());
    }
}
