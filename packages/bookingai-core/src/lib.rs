//! # BookingAI Core
//!
//! Encrypted local chat history for the BookingAI travel assistant.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       BOOKINGAI CORE MODULES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌──────────────┐   │
//! │  │  Identity   │  │   Prompt    │  │  Assistant  │  │ Conversation │   │
//! │  │             │  │             │  │             │  │              │   │
//! │  │ - /api/me/  │  │ - Passphr.  │  │ - /ai/chat/ │  │ - Messages   │   │
//! │  │ - Anonymous │  │ - Confirm   │  │ - Fallback  │  │ - Greeting   │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────┬──────┘  └──────┬───────┘   │
//! │         │                │                │                │           │
//! │         └────────────────┴───────┬────────┴────────────────┘           │
//! │                                  ▼                                      │
//! │                  ┌───────────────────────────────┐                      │
//! │                  │           Session             │                      │
//! │                  │ ConversationStore / Controller│                      │
//! │                  │ save worker (mpsc, FIFO)      │                      │
//! │                  └───────────────┬───────────────┘                      │
//! │                                  │                                      │
//! │  ┌─────────────────────────┐     │     ┌─────────────────────────────┐ │
//! │  │        Crypto           │◄────┴────►│          Storage            │ │
//! │  │                         │           │                             │ │
//! │  │ - AES-256-GCM           │           │ - KeyValueStore trait       │ │
//! │  │ - PBKDF2-HMAC-SHA256    │           │ - Memory / File backends    │ │
//! │  │ - Random device keys    │           │ - Envelope + salt + key     │ │
//! │  └─────────────────────────┘           └─────────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error type shared by the whole library
//! - [`crypto`] - Keys, passphrase derivation, envelope encryption
//! - [`storage`] - Key-value backends and per-identity slots
//! - [`conversation`] - Messages and the ordered log
//! - [`session`] - Conversation lifecycle and persistence
//! - [`identity`] - Who owns the history
//! - [`assistant`] - Reply backend with canned fallback
//! - [`prompt`] - Passphrase and confirmation prompts
//! - [`config`] - Environment-driven configuration
//!
//! ## Protection Modes
//!
//! | Mode | Key source | Stored |
//! |------|------------|--------|
//! | `key` | 32 random bytes | envelope + `chat_key_<id>` |
//! | `passphrase` | PBKDF2(passphrase, salt) | envelope + `chat_storage_<id>_salt` |
//!
//! Upgrading from `key` to `passphrase` writes the new envelope before the
//! device key is deleted, and there is no way back short of clearing history.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bookingai_core::{
//!     Assistant, ChatConfig, ConversationStore, MemoryStore, ScriptedPrompt, StaticIdentity,
//!     Identity,
//! };
//!
//! let store = ConversationStore::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(StaticIdentity(Identity::user("u1"))),
//!     Arc::new(ScriptedPrompt::new()),
//!     ChatConfig::default(),
//! );
//! let chat = store.init().await?;
//! chat.send("Find me a luxury hotel in Paris", &Assistant::offline()).await?;
//! store.teardown().await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod assistant;
pub mod config;
pub mod conversation;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod prompt;
pub mod session;
pub mod storage;
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use assistant::{Assistant, AssistantReply, HttpReplyBackend, ReplyBackend, ReplySource};
pub use config::ChatConfig;
pub use conversation::{ChatMessage, ConversationLog, Role};
pub use crypto::{ChatKey, Salt};
pub use error::{Error, Result, UserNotice};
pub use identity::{HttpIdentityProvider, Identity, IdentityProvider, StaticIdentity};
pub use prompt::{ConfirmAction, PassphrasePurpose, ScriptedPrompt, UserPrompt};
pub use session::{ControllerState, ConversationController, ConversationStore, LoadOutcome, ReadyMode};
pub use storage::{FileStore, KeyValueStore, MemoryStore, ProtectionMode, StoredEnvelope};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of BookingAI Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        #[cfg(target_os = "macos")]
        target: "macos",
        #[cfg(target_os = "linux")]
        target: "linux",
        #[cfg(target_os = "windows")]
        target: "windows",
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        target: "unknown",
        kdf_iterations: crypto::PBKDF2_ITERATIONS,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target operating system
    pub target: &'static str,
    /// PBKDF2 iteration count used for passphrase keys
    pub kdf_iterations: u32,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================
