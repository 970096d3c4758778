//! # History Persistence Adapter
//!
//! Reads and writes one identity's three slots.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HistoryStore { kv, storage_id }                                       │
//! │                                                                         │
//! │  save(envelope)   → chat_storage_<id>       (overwrite)                │
//! │  load()           ← chat_storage_<id>       (None if never written)    │
//! │  store_salt/load_salt ↔ chat_storage_<id>_salt                         │
//! │  device key       ↔ chat_key_<id>                                      │
//! │  clear()          ✗ all three                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use super::{slots, KeyValueStore, StoredEnvelope};
use crate::crypto::Salt;
use crate::error::{Error, Result};

/// Persistence adapter for a single identity
#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    storage_id: String,
}

impl HistoryStore {
    /// Bind the backing store to an identity's storage id
    pub fn new(kv: Arc<dyn KeyValueStore>, storage_id: impl Into<String>) -> Self {
        Self {
            kv,
            storage_id: storage_id.into(),
        }
    }

    /// Storage id used in slot names
    pub fn storage_id(&self) -> &str {
        &self.storage_id
    }

    /// Overwrite the stored envelope
    pub fn save(&self, envelope: &StoredEnvelope) -> Result<()> {
        let json = envelope.to_json()?;
        self.kv.set(&slots::history(&self.storage_id), &json)
    }

    /// Read the stored envelope
    ///
    /// `Ok(None)` when nothing has been saved yet, `StorageCorrupted` when
    /// the slot holds something that is not an envelope.
    pub fn load(&self) -> Result<Option<StoredEnvelope>> {
        match self.kv.get(&slots::history(&self.storage_id))? {
            Some(text) => StoredEnvelope::from_json(&text).map(Some),
            None => Ok(None),
        }
    }

    /// Persist the passphrase salt
    pub fn store_salt(&self, salt: &Salt) -> Result<()> {
        self.kv.set(&slots::salt(&self.storage_id), &salt.to_base64())
    }

    /// Read the passphrase salt
    pub fn load_salt(&self) -> Result<Option<Salt>> {
        match self.kv.get(&slots::salt(&self.storage_id))? {
            Some(text) => Salt::from_base64(&text)
                .map(Some)
                .map_err(|e| Error::StorageCorrupted(format!("unreadable salt: {}", e))),
            None => Ok(None),
        }
    }

    /// Delete the passphrase salt slot
    pub fn remove_salt(&self) -> Result<bool> {
        self.kv.remove(&slots::salt(&self.storage_id))
    }

    /// Read the exported device key
    pub fn load_device_key(&self) -> Result<Option<String>> {
        self.kv.get(&slots::device_key(&self.storage_id))
    }

    /// Persist an exported device key
    pub fn store_device_key(&self, exported: &str) -> Result<()> {
        self.kv.set(&slots::device_key(&self.storage_id), exported)
    }

    /// Delete the device key slot
    pub fn remove_device_key(&self) -> Result<bool> {
        self.kv.remove(&slots::device_key(&self.storage_id))
    }

    /// Delete the envelope, salt and device key slots
    ///
    /// Every delete is attempted; the first failure is reported.
    pub fn clear(&self) -> Result<()> {
        let results = [
            self.kv.remove(&slots::history(&self.storage_id)),
            self.kv.remove(&slots::salt(&self.storage_id)),
            self.kv.remove(&slots::device_key(&self.storage_id)),
        ];

        for result in results {
            result?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
