//! Document model
//!
//! A document is either a grid of text cells (the default layout) or a
//! single block of text. Its identifier is a random UUID that doubles as
//! the storage key.
//!
//! ## Stored format
//!
//! - Grid: JSON array of rows, each an array of strings
//! - Text: the raw text
//!
//! The identifier is not part of the stored value; it is the key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Rows in a fresh grid
pub const DEFAULT_ROWS: usize = 100;

/// Columns in a fresh grid
pub const DEFAULT_COLUMNS: usize = 25;

/// Errors from parsing identifiers or decoding stored documents
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Identifier is not a UUID
    #[error("Invalid document ID '{id}': {source}")]
    InvalidId {
        id: String,
        #[source]
        source: uuid::Error,
    },

    /// Stored value could not be decoded
    #[error("Invalid document format for '{id}': {details}")]
    InvalidFormat { id: DocumentId, details: String },

    /// Snapshot could not be encoded
    #[error("Failed to encode document '{id}': {source}")]
    Encode {
        id: DocumentId,
        #[source]
        source: serde_json::Error,
    },
}

/// Identifier of a document, also its storage key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a new random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Storage key for this document
    pub fn key(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for DocumentId {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|source| DocumentError::InvalidId {
                id: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How document content is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Grid,
    Text,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Grid => write!(f, "grid"),
            DocumentKind::Text => write!(f, "text"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" => Ok(DocumentKind::Grid),
            "text" => Ok(DocumentKind::Text),
            other => Err(format!("unknown document kind '{}' (expected grid or text)", other)),
        }
    }
}

/// Rectangular grid of text cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLUMNS)
    }
}

impl Grid {
    /// Empty grid of the given size
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: vec![vec![String::new(); columns]; rows],
        }
    }

    /// Grid from saved rows, padded to at least the default size
    ///
    /// Existing cells keep their position; short rows and missing rows are
    /// filled with empty cells.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut grid = Self { rows };
        grid.pad_to(DEFAULT_ROWS, DEFAULT_COLUMNS);
        grid
    }

    /// Grow to at least `rows` x `columns`, keeping the grid rectangular
    pub fn pad_to(&mut self, rows: usize, columns: usize) {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(columns);

        if self.rows.len() < rows {
            self.rows.resize_with(rows, Vec::new);
        }
        for row in &mut self.rows {
            row.resize_with(width, String::new);
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    /// Overwrite a cell, returning whether the content changed
    ///
    /// Out-of-range positions are ignored.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> bool {
        let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) else {
            return false;
        };
        let value = value.into();
        if *cell == value {
            return false;
        }
        *cell = value;
        true
    }

    /// True when every cell is empty
    pub fn is_blank(&self) -> bool {
        self.rows.iter().flatten().all(String::is_empty)
    }

    /// Non-empty cells as `(row, column, text)`
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize, &str)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| !cell.is_empty())
                .map(move |(c, cell)| (r, c, cell.as_str()))
        })
    }
}

/// Content of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Grid(Grid),
    Text(String),
}

impl Content {
    /// Fresh, empty content of the given kind
    pub fn empty(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Grid => Content::Grid(Grid::default()),
            DocumentKind::Text => Content::Text(String::new()),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Content::Grid(_) => DocumentKind::Grid,
            Content::Text(_) => DocumentKind::Text,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Content::Grid(grid) => grid.is_blank(),
            Content::Text(text) => text.is_empty(),
        }
    }
}

/// Full content of a document at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    pub content: Content,
}

impl DocumentSnapshot {
    /// Empty document of the given kind
    pub fn empty(id: DocumentId, kind: DocumentKind) -> Self {
        Self {
            id,
            content: Content::empty(kind),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.content.kind()
    }

    /// Encode the content as a stored value
    pub fn encode(&self) -> Result<String, DocumentError> {
        match &self.content {
            Content::Grid(grid) => {
                serde_json::to_string(grid).map_err(|source| DocumentError::Encode {
                    id: self.id,
                    source,
                })
            }
            Content::Text(text) => Ok(text.clone()),
        }
    }

    /// Decode a stored value
    ///
    /// The content kind follows the stored value: JSON rows decode to a grid
    /// whatever `preferred` says, and a value that does not look like JSON is
    /// text. `preferred` only settles the ambiguous cases. A JSON `null`
    /// decodes to an empty grid when a grid is preferred, and malformed JSON is
    /// an error unless text is preferred.
    pub fn decode(
        id: DocumentId,
        preferred: DocumentKind,
        value: &str,
    ) -> Result<Self, DocumentError> {
        let content = match serde_json::from_str::<Option<Vec<Vec<String>>>>(value) {
            Ok(Some(rows)) => Content::Grid(Grid::from_rows(rows)),
            Ok(None) if preferred == DocumentKind::Grid => Content::Grid(Grid::default()),
            Err(e) if preferred == DocumentKind::Grid && looks_like_json(value) => {
                return Err(DocumentError::InvalidFormat {
                    id,
                    details: e.to_string(),
                });
            }
            _ => Content::Text(value.to_string()),
        };
        Ok(Self { id, content })
    }
}

fn looks_like_json(value: &str) -> bool {
    let value = value.trim_start();
    value.starts_with('[') || value.starts_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_roundtrip() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert_eq!(id.key().len(), 36);
    }

    #[test]
    fn test_document_ids_are_unique() {
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn test_invalid_document_id() {
        let err = "not-a-uuid".parse::<DocumentId>().unwrap_err();
        assert!(matches!(err, DocumentError::InvalidId { .. }));
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn test_default_grid_size() {
        let grid = Grid::default();
        assert_eq!(grid.row_count(), DEFAULT_ROWS);
        assert_eq!(grid.column_count(), DEFAULT_COLUMNS);
        assert!(grid.is_blank());
    }

    #[test]
    fn test_small_grid_is_padded_in_place() {
        let grid = Grid::from_rows(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string()],
        ]);

        assert_eq!(grid.row_count(), DEFAULT_ROWS);
        assert_eq!(grid.column_count(), DEFAULT_COLUMNS);
        assert_eq!(grid.cell(0, 0), Some("a"));
        assert_eq!(grid.cell(0, 1), Some("b"));
        assert_eq!(grid.cell(1, 0), Some("c"));
        assert_eq!(grid.cell(1, 1), Some(""));
        assert_eq!(grid.cell(99, 24), Some(""));
    }

    #[test]
    fn test_large_grid_is_kept() {
        let mut rows = vec![vec![String::new(); 30]; 120];
        rows[119][29] = "corner".to_string();
        let grid = Grid::from_rows(rows);

        assert_eq!(grid.row_count(), 120);
        assert_eq!(grid.column_count(), 30);
        assert_eq!(grid.cell(119, 29), Some("corner"));
    }

    #[test]
    fn test_set_cell() {
        let mut grid = Grid::new(2, 2);
        assert!(grid.set_cell(1, 1, "x"));
        assert!(!grid.set_cell(1, 1, "x"));
        assert!(!grid.set_cell(5, 5, "y"));
        assert_eq!(grid.cell(1, 1), Some("x"));

        let filled: Vec<_> = grid.filled_cells().collect();
        assert_eq!(filled, vec![(1, 1, "x")]);
    }

    #[test]
    fn test_grid_snapshot_roundtrip() {
        let id = DocumentId::new();
        let mut grid = Grid::default();
        grid.set_cell(0, 0, "Intro. [00:00:04] ");
        grid.set_cell(3, 2, "with \"quotes\", commas");
        let snapshot = DocumentSnapshot {
            id,
            content: Content::Grid(grid),
        };

        let value = snapshot.encode().unwrap();
        let decoded = DocumentSnapshot::decode(id, DocumentKind::Grid, &value).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_grid_is_stored_as_json_rows() {
        let snapshot = DocumentSnapshot {
            id: DocumentId::new(),
            content: Content::Grid(Grid::new(1, 2)),
        };
        assert_eq!(snapshot.encode().unwrap(), r#"[["",""]]"#);
    }

    #[test]
    fn test_text_snapshot_is_raw() {
        let id = DocumentId::new();
        let snapshot = DocumentSnapshot {
            id,
            content: Content::Text("plain. [00:00:01] ".to_string()),
        };
        let value = snapshot.encode().unwrap();
        assert_eq!(value, "plain. [00:00:01] ");
        assert_eq!(
            DocumentSnapshot::decode(id, DocumentKind::Text, &value).unwrap(),
            snapshot
        );
    }

    #[test]
    fn test_null_decodes_to_empty_grid() {
        let id = DocumentId::new();
        let decoded = DocumentSnapshot::decode(id, DocumentKind::Grid, "null").unwrap();
        assert_eq!(decoded, DocumentSnapshot::empty(id, DocumentKind::Grid));
    }

    #[test]
    fn test_stored_value_decides_the_kind() {
        let id = DocumentId::new();
        let mut cells = Grid::default();
        cells.set_cell(0, 0, "a");
        let grid = DocumentSnapshot {
            id,
            content: Content::Grid(cells),
        };
        let value = grid.encode().unwrap();
        assert_eq!(
            DocumentSnapshot::decode(id, DocumentKind::Text, &value).unwrap(),
            grid
        );

        let text = DocumentSnapshot::decode(id, DocumentKind::Grid, "plain. [00:00:01] ").unwrap();
        assert_eq!(text.content, Content::Text("plain. [00:00:01] ".to_string()));
        assert_eq!(text.kind(), DocumentKind::Text);

        // Only a preferred grid reads `null` as one
        let null = DocumentSnapshot::decode(id, DocumentKind::Text, "null").unwrap();
        assert_eq!(null.content, Content::Text("null".to_string()));
        let broken = DocumentSnapshot::decode(id, DocumentKind::Text, "[oops").unwrap();
        assert_eq!(broken.content, Content::Text("[oops".to_string()));
    }

    #[test]
    fn test_malformed_grid_is_an_error() {
        let id = DocumentId::new();
        let err = DocumentSnapshot::decode(id, DocumentKind::Grid, "{not json").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidFormat { .. }));
    }

    #[test]
    fn test_document_kind_parse() {
        assert_eq!("grid".parse::<DocumentKind>().unwrap(), DocumentKind::Grid);
        assert_eq!("TEXT".parse::<DocumentKind>().unwrap(), DocumentKind::Text);
        assert!("table".parse::<DocumentKind>().is_err());
    }
}
