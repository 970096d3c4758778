//! Stored envelope format.

use serde::{Deserialize, Serialize};

use crate::crypto::{open_base64, seal, ChatKey};
use crate::error::{Error, Result};

/// How the key for an envelope is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionMode {
    /// Random device key kept in `chat_key_<id>`
    Key,
    /// Key derived from a passphrase and the stored salt
    Passphrase,
}

impl std::fmt::Display for ProtectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtectionMode::Key => f.write_str("key"),
            ProtectionMode::Passphrase => f.write_str("passphrase"),
        }
    }
}

/// The persisted record in `chat_storage_<id>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEnvelope {
    /// Key origin
    pub mode: ProtectionMode,
    /// Base64 AES-GCM nonce
    pub iv: String,
    /// Base64 ciphertext with tag
    pub data: String,
}

impl StoredEnvelope {
    /// Seal `plaintext` under `key` into a new envelope
    pub fn seal(mode: ProtectionMode, key: &ChatKey, plaintext: &[u8]) -> Result<Self> {
        let sealed = seal(key, plaintext)?;
        Ok(Self {
            mode,
            iv: sealed.nonce.to_base64(),
            data: sealed.ciphertext_base64(),
        })
    }

    /// Decrypt the envelope with `key`
    pub fn open(&self, key: &ChatKey) -> Result<Vec<u8>> {
        open_base64(key, &self.iv, &self.data)
    }

    /// Serialize to the slot's JSON text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the slot's JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::StorageCorrupted(format!("unreadable envelope: {}", e)))
    }
}
