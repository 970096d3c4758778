//! # Cryptography Module
//!
//! Cryptographic primitives protecting the locally stored chat transcript.
//!
//! ## Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY SOURCES                                  │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │   Device mode                      Passphrase mode             │   │
//! │  │   ───────────                      ───────────────             │   │
//! │  │   OsRng → 32 bytes                 PBKDF2-HMAC-SHA256          │   │
//! │  │   stored as base64                 (passphrase, salt,          │   │
//! │  │   in chat_key_<id>                  250,000 iterations)        │   │
//! │  │                                    key never stored            │   │
//! │  │            │                               │                    │   │
//! │  │            └──────────────┬────────────────┘                    │   │
//! │  │                           ▼                                     │   │
//! │  │                  ChatKey (AES-256)                              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ENCRYPTION SCHEME                               │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  AES-256-GCM                                                    │   │
//! │  │  • 256-bit key                                                  │   │
//! │  │  • 96-bit nonce (random per save)                               │   │
//! │  │  • 128-bit authentication tag                                   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: `ChatKey` is zeroized when dropped
//! 2. **Secure Random**: `rand::rngs::OsRng` for keys, salts and nonces
//! 3. **No Nonce Reuse**: `seal` mints its own nonce on every call

mod encryption;
mod kdf;
mod keys;
pub mod random;

pub use encryption::{open, open_base64, seal, Nonce, SealedPayload, NONCE_SIZE, TAG_SIZE};
pub use kdf::{
    derive_from_passphrase, derive_from_passphrase_blocking, generate_salt, PBKDF2_ITERATIONS,
};
pub use keys::{ChatKey, Salt, KEY_SIZE, SALT_SIZE};
