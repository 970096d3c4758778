//! # Encryption Module
//!
//! Provides AES-256-GCM sealing for the stored chat transcript.
//!
//! ## Seal / Open Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      TRANSCRIPT SEAL FLOW                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Step 1: Generate Nonce (every save)                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  Random 12 bytes from OsRng                                  │       │
//! │  │  (seal() never accepts a nonce from the caller)             │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Step 2: Encrypt                                                       │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  AES-256-GCM(                                                │       │
//! │  │    key = chat_key,                                          │       │
//! │  │    nonce = random_nonce,                                    │       │
//! │  │    plaintext = serialized conversation log                  │       │
//! │  │  )                                                          │       │
//! │  │           ↓                                                  │       │
//! │  │  Ciphertext + 16-byte Auth Tag                              │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Output: SealedPayload { nonce, ciphertext }  → base64 iv / data       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Confidentiality | Only the holder of the chat key can read the transcript |
//! | Integrity | Any modification of iv or data is detected on open |
//! | Nonce freshness | A new random nonce per seal |

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};

use super::keys::ChatKey;
use super::random::{from_base64, from_base64_array, random_bytes, to_base64};
use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// A nonce (number used once) for AES-GCM
///
/// **Never reuse a nonce with the same key.** Fresh nonces are only minted
/// inside [`seal`]; outside code can only rebuild one from stored bytes to
/// [`open`] an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    fn random() -> Self {
        Self(random_bytes())
    }

    /// Create from stored bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }

    /// Encode for the envelope `iv` field
    pub fn to_base64(&self) -> String {
        to_base64(&self.0)
    }

    /// Decode an envelope `iv` field
    pub fn from_base64(encoded: &str) -> Result<Self> {
        from_base64_array::<NONCE_SIZE>(encoded, "iv").map(Self)
    }
}

/// Output of [`seal`]
#[derive(Clone, Debug)]
pub struct SealedPayload {
    /// Nonce used for this seal
    pub nonce: Nonce,
    /// Ciphertext with the authentication tag appended
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Base64 ciphertext for the envelope `data` field
    pub fn ciphertext_base64(&self) -> String {
        to_base64(&self.ciphertext)
    }
}

/// Encrypt a payload under `key` with a freshly generated nonce
pub fn seal(key: &ChatKey, plaintext: &[u8]) -> Result<SealedPayload> {
    let nonce = Nonce::random();
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce.0), plaintext)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    Ok(SealedPayload { nonce, ciphertext })
}

/// Decrypt a payload sealed with [`seal`]
///
/// ## Errors
///
/// Returns `DecryptionFailed` if:
/// - The key is wrong
/// - The ciphertext was tampered with
/// - The nonce does not belong to this ciphertext
pub fn open(key: &ChatKey, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(Error::DecryptionFailed("ciphertext shorter than auth tag".into()));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| Error::DecryptionFailed(format!("Invalid key: {}", e)))?;

    cipher
        .decrypt(AesNonce::from_slice(&nonce.0), ciphertext)
        .map_err(|_| Error::DecryptionFailed("authentication tag mismatch".into()))
}

/// Decode base64 `iv` / `data` fields and [`open`] them
///
/// Malformed encodings are reported as `DecryptionFailed`, since for the
/// caller an undecodable envelope is the same as an unopenable one.
pub fn open_base64(key: &ChatKey, iv: &str, data: &str) -> Result<Vec<u8>> {
    let nonce = Nonce::from_base64(iv)
        .map_err(|e| Error::DecryptionFailed(format!("bad iv: {}", e)))?;
    let ciphertext =
        from_base64(data).map_err(|e| Error::DecryptionFailed(format!("bad data: {}", e)))?;

    open(key, &nonce, &ciphertext)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seal_open_basic() {
        let key = ChatKey::from_bytes([42u8; 32]);
        let plaintext = br#"[{"role":"assistant","content":"Hi!"}]"#;

        let sealed = seal(&key, plaintext).unwrap();
        let opened = open(&key, &sealed.nonce, &sealed.ciphertext).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_seal_open_empty() {
        let key = ChatKey::generate();

        let sealed = seal(&key, b"").unwrap();
        assert_eq!(sealed.ciphertext.len(), TAG_SIZE);

        let opened = open(&key, &sealed.nonce, &sealed.ciphertext).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn test_nonces_unique_across_seals() {
        let key = ChatKey::generate();
        let nonces: HashSet<Nonce> = (0..256)
            .map(|_| seal(&key, b"same text").unwrap().nonce)
            .collect();

        assert_eq!(nonces.len(), 256);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = ChatKey::generate();
        let key2 = ChatKey::generate();

        let sealed = seal(&key1, b"Find me a luxury hotel in Paris").unwrap();
        let result = open(&key2, &sealed.nonce, &sealed.ciphertext);

        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = ChatKey::generate();
        let mut sealed = seal(&key, b"Hello, World!").unwrap();

        sealed.ciphertext[0] ^= 0xFF;

        let result = open(&key, &sealed.nonce, &sealed.ciphertext);
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_mismatched_nonce_fails() {
        let key = ChatKey::generate();
        let first = seal(&key, b"first").unwrap();
        let second = seal(&key, b"second").unwrap();

        let result = open(&key, &second.nonce, &first.ciphertext);
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = ChatKey::generate();
        let sealed = seal(&key, b"short").unwrap();

        let result = open(&key, &sealed.nonce, &sealed.ciphertext[..4]);
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_open_base64() {
        let key = ChatKey::generate();
        let sealed = seal(&key, b"Recommend hotels for families").unwrap();

        let opened = open_base64(
            &key,
            &sealed.nonce.to_base64(),
            &sealed.ciphertext_base64(),
        )
        .unwrap();
        assert_eq!(opened, b"Recommend hotels for families");

        let bad_iv = open_base64(&key, "AAAA", &sealed.ciphertext_base64());
        assert!(matches!(bad_iv, Err(Error::DecryptionFailed(_))));
    }
}
