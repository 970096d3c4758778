//! # Key Derivation Functions
//!
//! Passphrase-based key derivation for protecting the chat transcript.
//!
//! ## Derivation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 PASSPHRASE → CHAT KEY                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PBKDF2-HMAC-SHA256(                                            │   │
//! │  │    password   = passphrase (UTF-8),                             │   │
//! │  │    salt       = 16 random bytes (chat_storage_<id>_salt),       │   │
//! │  │    iterations = 250,000,                                        │   │
//! │  │    output     = 32 bytes                                        │   │
//! │  │  )                                                              │   │
//! │  │                                                                 │   │
//! │  │  → AES-256-GCM key                                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Same (passphrase, salt) always yields the same key, so the history    │
//! │  can be reopened after the passphrase is typed again.                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Parameters
//!
//! | Aspect | Choice |
//! |--------|--------|
//! | KDF Algorithm | PBKDF2 with HMAC-SHA256 |
//! | Iterations | 250,000 (fixed; changing it orphans existing envelopes) |
//! | Salt | 16 random bytes per passphrase |
//! | Output | 32 bytes |

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::{ChatKey, Salt, KEY_SIZE};
use crate::error::{Error, Result};

/// Fixed PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 250_000;

/// Derive a chat key from a passphrase and salt
///
/// Deterministic and deliberately slow. Async callers should use
/// [`derive_from_passphrase_blocking`] so the runtime is not stalled.
///
/// ## Errors
///
/// Returns `EmptyPassphrase` for an empty passphrase.
pub fn derive_from_passphrase(passphrase: &str, salt: &Salt) -> Result<ChatKey> {
    if passphrase.is_empty() {
        return Err(Error::EmptyPassphrase);
    }

    let mut output = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(
        passphrase.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut output[..],
    );

    Ok(ChatKey::from_bytes(*output))
}

/// Fresh random salt for a new passphrase
pub fn generate_salt() -> Salt {
    Salt::generate()
}

/// Run [`derive_from_passphrase`] on the blocking thread pool
pub async fn derive_from_passphrase_blocking(passphrase: String, salt: Salt) -> Result<ChatKey> {
    let passphrase = Zeroizing::new(passphrase);
    tokio::task::spawn_blocking(move || derive_from_passphrase(&passphrase, &salt))
        .await
        .map_err(|e| Error::KeyDerivationFailed(format!("derivation task failed: {}", e)))?
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_deterministic() {
        let salt = Salt::from_bytes([9u8; 16]);

        let key1 = derive_from_passphrase("correct-horse", &salt).unwrap();
        let key2 = derive_from_passphrase("correct-horse", &salt).unwrap();

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_different_passphrases_different_keys() {
        let salt = Salt::from_bytes([9u8; 16]);

        let key1 = derive_from_passphrase("correct-horse", &salt).unwrap();
        let key2 = derive_from_passphrase("battery-staple", &salt).unwrap();

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_different_salts_different_keys() {
        let key1 = derive_from_passphrase("correct-horse", &Salt::from_bytes([1u8; 16])).unwrap();
        let key2 = derive_from_passphrase("correct-horse", &Salt::from_bytes([2u8; 16])).unwrap();

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let result = derive_from_passphrase("", &Salt::generate());
        assert!(matches!(result, Err(Error::EmptyPassphrase)));
    }

    #[tokio::test]
    async fn test_blocking_matches_sync() {
        let salt = Salt::from_bytes([5u8; 16]);

        let sync_key = derive_from_passphrase("sunset-suite", &salt).unwrap();
        let async_key = derive_from_passphrase_blocking("sunset-suite".into(), salt)
            .await
            .unwrap();

        assert_eq!(sync_key, async_key);
    }
}
