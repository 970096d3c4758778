//! # Key Material
//!
//! Symmetric keys protecting the stored chat transcript.
//!
//! ## Key Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           KEY TYPES                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  ChatKey (AES-256-GCM)                                          │   │
//! │  │  ─────────────────────                                           │   │
//! │  │                                                                  │   │
//! │  │  Origin (exactly one per identity):                             │   │
//! │  │  • Device key  - 32 random bytes, exported as base64 into       │   │
//! │  │                  chat_key_<identity>                            │   │
//! │  │  • Passphrase  - PBKDF2-HMAC-SHA256(passphrase, salt), never    │   │
//! │  │                  persisted, re-derived on every load            │   │
//! │  │                                                                  │   │
//! │  │  Zeroized when dropped.                                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Salt (16 bytes)                                                │   │
//! │  │  ────────────────                                                │   │
//! │  │                                                                  │   │
//! │  │  Random, generated once per passphrase, stored in               │   │
//! │  │  chat_storage_<identity>_salt. Not secret.                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use zeroize::ZeroizeOnDrop;

use super::random::{from_base64_array, random_bytes, to_base64};
use crate::error::{Error, Result};

/// Size of the chat encryption key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of the passphrase salt in bytes (128 bits)
pub const SALT_SIZE: usize = 16;

/// An AES-256-GCM key for the chat transcript
///
/// Zeroized when dropped. `Debug` never prints the key bytes.
#[derive(Clone, ZeroizeOnDrop)]
pub struct ChatKey([u8; KEY_SIZE]);

impl ChatKey {
    /// Generate a new random key from the OS CSPRNG
    pub fn generate() -> Self {
        Self(random_bytes())
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Export the raw key as base64 for the device key slot
    pub fn export(&self) -> String {
        to_base64(&self.0)
    }

    /// Import a raw key previously produced by [`ChatKey::export`]
    pub fn import(encoded: &str) -> Result<Self> {
        from_base64_array::<KEY_SIZE>(encoded, "key")
            .map(Self)
            .map_err(|e| Error::InvalidKey(e.to_string()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for ChatKey {
    fn eq(&self, other: &Self) -> bool {
        // Not constant time; only used to compare keys in tests and diagnostics.
        self.0 == other.0
    }
}

impl Eq for ChatKey {}

impl fmt::Debug for ChatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChatKey(<redacted>)")
    }
}

/// Salt for passphrase key derivation
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generate a fresh random salt
    pub fn generate() -> Self {
        Self(random_bytes())
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }

    /// Encode for the salt slot
    pub fn to_base64(&self) -> String {
        to_base64(&self.0)
    }

    /// Decode from the salt slot
    pub fn from_base64(encoded: &str) -> Result<Self> {
        from_base64_array::<SALT_SIZE>(encoded, "salt").map(Self)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(ChatKey::generate(), ChatKey::generate());
    }

    #[test]
    fn test_export_import_round_trip() {
        let key = ChatKey::generate();
        let exported = key.export();

        let imported = ChatKey::import(&exported).unwrap();
        assert_eq!(key, imported);
    }

    #[test]
    fn test_import_rejects_wrong_length() {
        let short = to_base64(&[1u8; 16]);
        assert!(matches!(ChatKey::import(&short), Err(Error::InvalidKey(_))));
        assert!(matches!(ChatKey::import("%%%"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = ChatKey::from_bytes([0xAB; KEY_SIZE]);
        let shown = format!("{:?}", key);
        assert_eq!(shown, "ChatKey(<redacted>)");
        assert!(!shown.contains("ab"));
    }

    #[test]
    fn test_salt_base64() {
        let salt = Salt::from_bytes([3u8; SALT_SIZE]);
        let decoded = Salt::from_base64(&salt.to_base64()).unwrap();
        assert_eq!(salt, decoded);
        assert_ne!(Salt::generate(), Salt::generate());
    }
}
