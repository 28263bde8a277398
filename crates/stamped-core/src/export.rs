//! CSV export
//!
//! Produces the bytes of `stamped.csv`: a UTF-8 byte-order mark (so
//! spreadsheet tools pick the right encoding) followed by one CSV record
//! per grid row, with no header.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::{Content, DocumentSnapshot, Grid};

/// File name of every export
pub const EXPORT_FILE_NAME: &str = "stamped.csv";

/// UTF-8 byte-order mark
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Errors while exporting
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to format CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write export to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Encode a grid as BOM-prefixed CSV
pub fn to_csv(grid: &Grid) -> Result<Vec<u8>, ExportError> {
    records_to_csv(grid.rows().iter().map(|row| row.as_slice()))
}

/// Encode any snapshot; plain text becomes a single cell
pub fn snapshot_to_csv(snapshot: &DocumentSnapshot) -> Result<Vec<u8>, ExportError> {
    match &snapshot.content {
        Content::Grid(grid) => to_csv(grid),
        Content::Text(text) => records_to_csv(std::iter::once(std::slice::from_ref(text))),
    }
}

fn records_to_csv<'a>(
    rows: impl Iterator<Item = &'a [String]>,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(UTF8_BOM.to_vec());

    for row in rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

/// Write `stamped.csv` for a snapshot into `dir`, returning the file path
pub fn write_export(dir: &Path, snapshot: &DocumentSnapshot) -> Result<PathBuf, ExportError> {
    let bytes = snapshot_to_csv(snapshot)?;
    let path = dir.join(EXPORT_FILE_NAME);

    fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(id = %snapshot.id, path = %path.display(), "Exported document");
    Ok(path)
}
