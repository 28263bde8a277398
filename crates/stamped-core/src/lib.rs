//! Stamped Core Library
//!
//! This crate provides the core functionality for Stamped, a note-taking
//! tool that stamps each finished sentence with the time elapsed on a
//! running stopwatch.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = DocumentStore::new(FileStore::from_config(&config)?, config.document_kind);
//! let mut session = Session::open(&mut store, DocumentId::new(), &SessionOptions::from(&config))?;
//!
//! session.start_timer(Instant::now());
//! session.type_char('.', Instant::now());   // appends " [00:00:00] "
//! session.poll(&mut store, Instant::now()); // ticks, autosave
//! ```
//!
//! # Modules
//!
//! - `session`: One open document (main entry point)
//! - `stopwatch`: Elapsed-time counter and `HH:MM:SS` formatting
//! - `stamp`: Text buffer with caret and inline timestamp insertion
//! - `autosave`: Debounced save countdown
//! - `document`: Identifiers, grid and text content, stored format
//! - `store`: Snapshot-level load/save over a key-value backend
//! - `storage`: Key-value backends (files, memory)
//! - `export`: CSV export
//! - `analytics`: Usage event sinks
//! - `route`: Landing and document view addresses
//! - `config`: Application configuration

pub mod analytics;
pub mod autosave;
pub mod config;
pub mod document;
pub mod export;
pub mod route;
pub mod session;
pub mod stamp;
pub mod stopwatch;
pub mod storage;
pub mod store;

pub use analytics::Analytics;
pub use autosave::AutosaveScheduler;
pub use config::Config;
pub use document::{Content, DocumentError, DocumentId, DocumentKind, DocumentSnapshot, Grid};
pub use export::ExportError;
pub use route::{Route, RouteError};
pub use session::{SaveStatus, Session, SessionEvent, SessionOptions};
pub use stamp::TextBuffer;
pub use stopwatch::{format_elapsed, Stopwatch, StopwatchState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use store::{DocumentEntry, DocumentStore, LoadOrigin};
