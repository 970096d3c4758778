//! # Session Module
//!
//! The process-wide conversation service and the per-identity controller.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CONVERSATION LIFECYCLE                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ConversationStore::new(kv, identity provider, prompt, config)         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  init()  ── resolve identity ── load history ──► Ready(controller)      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  controller().send / append / secure_with_passphrase / clear_history   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  teardown() ── flush queued saves ── stop worker ──► Uninitialized     │
//! │                                                                         │
//! │  Switching identity = teardown() then init() again.                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod controller;
mod worker;

pub use controller::{ControllerState, ConversationController, LoadOutcome, ReadyMode};

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ChatConfig;
use crate::error::{Error, Result};
use crate::identity::{resolve_identity, Identity, IdentityProvider};
use crate::prompt::UserPrompt;
use crate::storage::KeyValueStore;

enum Slot {
    Empty,
    Loading,
    Ready(Arc<ConversationController>),
}

/// Process-wide conversation service
///
/// Holds at most one active conversation at a time.
pub struct ConversationStore {
    kv: Arc<dyn KeyValueStore>,
    identity: Arc<dyn IdentityProvider>,
    prompt: Arc<dyn UserPrompt>,
    config: ChatConfig,
    slot: RwLock<Slot>,
}

impl ConversationStore {
    /// Create an uninitialized store
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        identity: Arc<dyn IdentityProvider>,
        prompt: Arc<dyn UserPrompt>,
        config: ChatConfig,
    ) -> Self {
        Self {
            kv,
            identity,
            prompt,
            config,
            slot: RwLock::new(Slot::Empty),
        }
    }

    /// Resolve the current user and load their conversation
    pub async fn init(&self) -> Result<Arc<ConversationController>> {
        self.begin_loading()?;
        let identity = resolve_identity(self.identity.as_ref()).await;
        self.finish_loading(identity).await
    }

    /// Load the conversation of a known identity
    pub async fn init_for(&self, identity: Identity) -> Result<Arc<ConversationController>> {
        self.begin_loading()?;
        self.finish_loading(identity).await
    }

    /// The active conversation
    pub fn controller(&self) -> Result<Arc<ConversationController>> {
        match &*self.slot.read() {
            Slot::Ready(controller) => Ok(controller.clone()),
            _ => Err(Error::NotInitialized),
        }
    }

    /// Lifecycle state of the active conversation
    pub fn state(&self) -> ControllerState {
        match &*self.slot.read() {
            Slot::Empty => ControllerState::Uninitialized,
            Slot::Loading => ControllerState::Loading,
            Slot::Ready(controller) => controller.state(),
        }
    }

    /// Flush and close the active conversation
    pub async fn teardown(&self) -> Result<()> {
        let controller = {
            let mut slot = self.slot.write();
            match std::mem::replace(&mut *slot, Slot::Empty) {
                Slot::Ready(controller) => controller,
                Slot::Loading => {
                    *slot = Slot::Loading;
                    return Err(Error::Internal("teardown during init".into()));
                }
                Slot::Empty => return Err(Error::NotInitialized),
            }
        };
        controller.teardown().await
    }

    /// Backend configuration
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn begin_loading(&self) -> Result<()> {
        let mut slot = self.slot.write();
        match *slot {
            Slot::Empty => {
                *slot = Slot::Loading;
                Ok(())
            }
            _ => Err(Error::AlreadyInitialized),
        }
    }

    async fn finish_loading(&self, identity: Identity) -> Result<Arc<ConversationController>> {
        let result = ConversationController::init(
            self.kv.clone(),
            identity,
            self.prompt.clone(),
            self.config.clone(),
        )
        .await;

        let mut slot = self.slot.write();
        match result {
            Ok(controller) => {
                let controller = Arc::new(controller);
                *slot = Slot::Ready(controller.clone());
                Ok(controller)
            }
            Err(e) => {
                *slot = Slot::Empty;
                Err(e)
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
