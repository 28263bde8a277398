//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use stamped_core::{Content, DocumentEntry, DocumentSnapshot};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a list of stored documents
    pub fn print_documents(&self, docs: &[DocumentEntry]) {
        match self.format {
            OutputFormat::Human => {
                if docs.is_empty() {
                    println!("No documents found.");
                    return;
                }
                for doc in docs {
                    let modified = doc
                        .modified
                        .map(|m| m.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{} | {} | {}", doc.id, modified, human_size(doc.size));
                }
                println!("\n{} document(s)", docs.len());
            }
            OutputFormat::Json => {
                let json_docs: Vec<_> = docs
                    .iter()
                    .map(|doc| {
                        serde_json::json!({
                            "id": doc.id,
                            "size": doc.size,
                            "modified": doc.modified,
                        })
                    })
                    .collect();
                println!("{}", serde_json::Value::Array(json_docs));
            }
            OutputFormat::Quiet => {
                for doc in docs {
                    println!("{}", doc.id);
                }
            }
        }
    }

    /// Print the filled content of a document
    pub fn print_document(&self, snapshot: &DocumentSnapshot) {
        match (&snapshot.content, self.format) {
            (Content::Grid(grid), OutputFormat::Human) => {
                println!("Document: {}", snapshot.id);
                println!();
                let mut count = 0;
                for (row, column, text) in grid.filled_cells() {
                    println!("[{}:{}] {}", row + 1, column + 1, text);
                    count += 1;
                }
                if count == 0 {
                    println!("(empty)");
                }
            }
            (Content::Text(text), OutputFormat::Human) => {
                println!("Document: {}", snapshot.id);
                println!();
                if text.is_empty() {
                    println!("(empty)");
                } else {
                    println!("{}", text);
                }
            }
            (Content::Grid(grid), OutputFormat::Json) => {
                println!(
                    "{}",
                    serde_json::json!({"id": snapshot.id, "kind": "grid", "rows": grid.rows()})
                );
            }
            (Content::Text(text), OutputFormat::Json) => {
                println!(
                    "{}",
                    serde_json::json!({"id": snapshot.id, "kind": "text", "text": text})
                );
            }
            (_, OutputFormat::Quiet) => {
                println!("{}", snapshot.id);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Render a byte count for humans
pub fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
