//! # Error Handling
//!
//! This module provides the error type shared by every part of BookingAI Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Lifecycle Errors                                                  │
//! │  │   ├── NotInitialized        - Store has no active conversation      │
//! │  │   ├── AlreadyInitialized    - init() called twice                   │
//! │  │   └── ShutdownInProgress    - Save worker already stopped           │
//! │  │                                                                      │
//! │  ├── Input Errors (surfaced to the user)                               │
//! │  │   ├── PassphraseMismatch    - Confirmation did not match            │
//! │  │   ├── EmptyPassphrase       - Passphrase was blank                  │
//! │  │   ├── PromptCancelled       - User dismissed a prompt               │
//! │  │   ├── EmptyMessage          - Nothing to send                       │
//! │  │   └── HistoryLocked         - Protected history not unlocked        │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── EncryptionFailed      - AES-GCM seal failed                   │
//! │  │   ├── DecryptionFailed      - Wrong key or tampered envelope        │
//! │  │   ├── KeyDerivationFailed   - PBKDF2 could not run                  │
//! │  │   └── InvalidKey            - Stored key has the wrong shape        │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── StorageUnavailable    - Read/write failed (quota, disabled)   │
//! │  │   └── StorageCorrupted      - Stored envelope is not parseable      │
//! │  │                                                                      │
//! │  └── Backend Errors                                                    │
//! │      ├── AssistantUnavailable  - AI reply endpoint failed              │
//! │      ├── IdentityUnavailable   - /api/me/ lookup failed                │
//! │      └── Timeout               - Remote call timed out                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ERROR HANDLING FLOW                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Crypto / Storage            Controller boundary         UI layer      │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Result<T, Error>  ──────►  log + fall back        (background saves)  │
//! │  Result<T, Error>  ──────►  UserNotice { code, .. } (user actions)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for BookingAI Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for BookingAI Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Lifecycle Errors (100-199)
    // ========================================================================

    /// No conversation has been initialized
    #[error("Conversation store has not been initialized. Call ConversationStore::init() first.")]
    NotInitialized,

    /// A conversation is already active for this store
    #[error("Conversation store is already initialized. Call teardown() before switching identity.")]
    AlreadyInitialized,

    /// The save worker has stopped
    #[error("Conversation is shutting down.")]
    ShutdownInProgress,

    // ========================================================================
    // Input Errors (200-299)
    // ========================================================================

    /// Passphrase and confirmation differ
    #[error("Passphrases do not match.")]
    PassphraseMismatch,

    /// Passphrase was empty
    #[error("Passphrase must not be empty.")]
    EmptyPassphrase,

    /// User dismissed a prompt
    #[error("Prompt was cancelled.")]
    PromptCancelled,

    /// Message text was blank
    #[error("Message must not be empty.")]
    EmptyMessage,

    /// History is passphrase-protected and has not been unlocked
    #[error("Chat history is locked. Unlock it with your passphrase first.")]
    HistoryLocked,

    // ========================================================================
    // Crypto Errors (300-399)
    // ========================================================================

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Key derivation failed
    #[error("Failed to derive key: {0}")]
    KeyDerivationFailed(String),

    /// Invalid key format or length
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ========================================================================
    // Storage Errors (400-499)
    // ========================================================================

    /// Local storage could not be read or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Stored data could not be parsed
    #[error("Data corruption detected: {0}")]
    StorageCorrupted(String),

    // ========================================================================
    // Backend Errors (500-599)
    // ========================================================================

    /// The AI reply endpoint failed
    #[error("Assistant unavailable: {0}")]
    AssistantUnavailable(String),

    /// The identity endpoint failed
    #[error("Identity lookup failed: {0}")]
    IdentityUnavailable(String),

    /// Operation timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Lifecycle
    /// - 200-299: User input
    /// - 300-399: Crypto
    /// - 400-499: Storage
    /// - 500-599: Backend
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Lifecycle (100-199)
            Error::NotInitialized => 100,
            Error::AlreadyInitialized => 101,
            Error::ShutdownInProgress => 102,

            // Input (200-299)
            Error::PassphraseMismatch => 200,
            Error::EmptyPassphrase => 201,
            Error::PromptCancelled => 202,
            Error::EmptyMessage => 203,
            Error::HistoryLocked => 204,

            // Crypto (300-399)
            Error::EncryptionFailed(_) => 300,
            Error::DecryptionFailed(_) => 301,
            Error::KeyDerivationFailed(_) => 302,
            Error::InvalidKey(_) => 303,

            // Storage (400-499)
            Error::StorageUnavailable(_) => 400,
            Error::StorageCorrupted(_) => 401,

            // Backend (500-599)
            Error::AssistantUnavailable(_) => 500,
            Error::IdentityUnavailable(_) => 501,
            Error::Timeout(_) => 502,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 901,
            Error::DeserializationError(_) => 902,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the in-memory conversation intact and can be
    /// retried or ignored.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::StorageUnavailable(_)
                | Error::DecryptionFailed(_)
                | Error::AssistantUnavailable(_)
                | Error::IdentityUnavailable(_)
                | Error::Timeout(_)
        )
    }

    /// Check if this error requires user action
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Error::PassphraseMismatch
                | Error::EmptyPassphrase
                | Error::EmptyMessage
                | Error::HistoryLocked
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::DeserializationError(format!("invalid base64: {}", err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StorageUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else {
            Error::AssistantUnavailable(err.to_string())
        }
    }
}

// ============================================================================
// UI ERROR REPRESENTATION
// ============================================================================

/// UI-friendly error representation
///
/// What the chat surface shows for a failed user-initiated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the error is recoverable
    pub recoverable: bool,
}

impl From<Error> for UserNotice {
    fn from(err: Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NotInitialized.code(), 100);
        assert_eq!(Error::PassphraseMismatch.code(), 200);
        assert_eq!(Error::EncryptionFailed("test".into()).code(), 300);
        assert_eq!(Error::DecryptionFailed("test".into()).code(), 301);
        assert_eq!(Error::StorageUnavailable("test".into()).code(), 400);
        assert_eq!(Error::AssistantUnavailable("test".into()).code(), 500);
        assert_eq!(Error::Internal("test".into()).code(), 900);
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::StorageUnavailable("quota".into()).is_recoverable());
        assert!(Error::DecryptionFailed("tag".into()).is_recoverable());
        assert!(!Error::PassphraseMismatch.is_recoverable());
        assert!(!Error::EncryptionFailed("x".into()).is_recoverable());
    }

    #[test]
    fn test_user_action_errors() {
        assert!(Error::PassphraseMismatch.requires_user_action());
        assert!(Error::HistoryLocked.requires_user_action());
        assert!(!Error::StorageUnavailable("x".into()).requires_user_action());
    }

    #[test]
    fn test_user_notice_conversion() {
        let notice: UserNotice = Error::PassphraseMismatch.into();

        assert_eq!(notice.code, 200);
        assert!(notice.message.contains("do not match"));
        assert!(!notice.recoverable);
    }

    #[test]
    fn test_base64_error_conversion() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

        let err: Error = BASE64.decode("@@not base64@@").unwrap_err().into();
        assert_eq!(err.code(), 902);
    }
}
