//! # Storage Module
//!
//! Per-identity persistence for the encrypted chat transcript.
//!
//! ## Storage Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SLOT LAYOUT                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  chat_storage_<id>          StoredEnvelope JSON                        │
//! │                             { "mode": "key" | "passphrase",            │
//! │                               "iv":   base64 (12 bytes),               │
//! │                               "data": base64 (ciphertext + tag) }      │
//! │                                                                         │
//! │  chat_storage_<id>_salt     base64 salt (passphrase mode only)         │
//! │                                                                         │
//! │  chat_key_<id>              base64 raw key (key mode only)             │
//! │                                                                         │
//! │  <id> is the user id, or "anonymous" for signed-out visitors.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Backends
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`MemoryStore`] | Tests, demos, ephemeral sessions |
//! | [`FileStore`] | The terminal client (one file per slot) |
//!
//! Everything above the backend only sees the [`KeyValueStore`] trait.

mod envelope;
mod file_store;
mod history;
mod keyring;
mod memory_store;

pub use envelope::{ProtectionMode, StoredEnvelope};
pub use file_store::FileStore;
pub use history::HistoryStore;
pub use keyring::ensure_key;
pub use memory_store::MemoryStore;

use crate::error::Result;

/// A string-keyed, string-valued local store
///
/// Shaped like browser `localStorage`: synchronous, UTF-8 values, no
/// transactions. Implementations must be safe to share between the
/// controller and its save worker.
pub trait KeyValueStore: Send + Sync {
    /// Read a slot, `None` if it has never been written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a slot, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool>;

    /// Whether a slot currently holds a value
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Slot names for an identity's storage id
pub mod slots {
    /// Prefix of the envelope slot
    pub const HISTORY_PREFIX: &str = "chat_storage_";
    /// Suffix appended to the envelope slot for the salt
    pub const SALT_SUFFIX: &str = "_salt";
    /// Prefix of the raw key slot
    pub const KEY_PREFIX: &str = "chat_key_";

    /// `chat_storage_<id>`
    pub fn history(storage_id: &str) -> String {
        format!("{}{}", HISTORY_PREFIX, storage_id)
    }

    /// `chat_storage_<id>_salt`
    pub fn salt(storage_id: &str) -> String {
        format!("{}{}{}", HISTORY_PREFIX, storage_id, SALT_SUFFIX)
    }

    /// `chat_key_<id>`
    pub fn device_key(storage_id: &str) -> String {
        format!("{}{}", KEY_PREFIX, storage_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_names() {
        assert_eq!(slots::history("u1"), "chat_storage_u1");
        assert_eq!(slots::salt("u1"), "chat_storage_u1_salt");
        assert_eq!(slots::device_key("u1"), "chat_key_u1");
        assert_eq!(slots::history("anonymous"), "chat_storage_anonymous");
    }
}
