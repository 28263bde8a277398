//! Storage layer
//!
//! Key-value persistence for documents. Keys are document identifiers and
//! values are encoded snapshots.
//!
//! ## Backends
//!
//! - **FileStore**: one file per key under the data directory
//! - **MemoryStore**: in-process map, for tests and throwaway sessions
//!
//! Both can enforce a byte quota; a write that would exceed it fails with
//! [`StorageError::CapacityExceeded`] and is not retried.

pub mod error;
pub mod file;
pub mod memory;

use chrono::{DateTime, Utc};

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Metadata about a stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub key: String,
    /// Size of the value in bytes
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Key-value storage for encoded documents
pub trait KeyValueStore {
    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> StorageResult<()>;

    /// All stored entries
    fn entries(&self) -> StorageResult<Vec<EntryInfo>>;
}

/// Bytes a key-value pair counts against a quota
pub(crate) fn entry_cost(key: &str, value_len: u64) -> u64 {
    key.len() as u64 + value_len
}
