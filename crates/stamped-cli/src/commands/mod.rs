//! Command handlers

pub mod config;
pub mod document;

use anyhow::{Context, Result};

use stamped_core::{Config, DocumentStore, FileStore};

/// Open the document store described by `config`
pub fn open_store(config: &Config) -> Result<DocumentStore<FileStore>> {
    let backend = FileStore::from_config(config).with_context(|| {
        format!(
            "Failed to open document storage at {}",
            config.documents_dir().display()
        )
    })?;
    Ok(DocumentStore::new(backend, config.document_kind))
}
