//! # In-Memory Key-Value Store
//!
//! A `localStorage`-shaped store kept in process memory.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MemoryStore                                                            │
//! │  ───────────                                                            │
//! │                                                                         │
//! │  RwLock<HashMap<String, String>>                                       │
//! │                                                                         │
//! │  • get(key)          - Clone of the stored text                        │
//! │  • set(key, value)   - Insert/overwrite, rejected past the quota       │
//! │  • remove(key)       - Delete, reports whether it existed              │
//! │                                                                         │
//! │  Quota: optional byte budget over all keys + values, mirroring the     │
//! │  per-origin limit a browser applies to localStorage.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;

use super::KeyValueStore;
use crate::error::{Error, Result};

/// In-memory key-value store
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    /// Maximum total bytes of keys + values, if limited
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an unlimited store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota: None,
        }
    }

    /// Create a store that rejects writes beyond `bytes` total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Sorted list of stored keys
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn used_bytes(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();

        if let Some(quota) = self.quota {
            let current = Self::used_bytes(&entries);
            let replaced = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = current - replaced + key.len() + value.len();
            if needed > quota {
                return Err(Error::StorageUnavailable(format!(
                    "quota exceeded writing {} ({} of {} bytes)",
                    key, needed, quota
                )));
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
