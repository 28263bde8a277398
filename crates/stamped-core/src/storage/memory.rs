//! In-memory key-value store

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{entry_cost, EntryInfo, KeyValueStore, StorageError, StorageResult};

/// Key-value store held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, (String, DateTime<Utc>)>,
    quota: Option<u64>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once `quota` bytes are used
    pub fn with_quota(quota: u64) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Bytes currently counted against the quota
    pub fn used_bytes(&self) -> u64 {
        self.values
            .iter()
            .map(|(k, (v, _))| entry_cost(k, v.len() as u64))
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.get(key).map(|(v, _)| v.clone()))
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if let Some(quota) = self.quota {
            let existing = self
                .values
                .get(key)
                .map(|(v, _)| entry_cost(key, v.len() as u64))
                .unwrap_or(0);
            let needed = self.used_bytes() - existing + entry_cost(key, value.len() as u64);
            if needed > quota {
                return Err(StorageError::CapacityExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        self.values
            .insert(key.to_string(), (value.to_string(), Utc::now()));
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.values.remove(key);
        Ok(())
    }

    fn entries(&self) -> StorageResult<Vec<EntryInfo>> {
        Ok(self
            .values
            .iter()
            .map(|(key, (value, modified))| EntryInfo {
                key: key.clone(),
                size: value.len() as u64,
                modified: Some(*modified),
            })
            .collect())
    }
}
