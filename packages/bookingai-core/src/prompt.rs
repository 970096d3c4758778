//! User prompts the controller needs mid-operation.
//!
//! The controller never reads a terminal or a dialog directly: it asks a
//! [`UserPrompt`] and awaits the answer.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

/// Why a passphrase is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphrasePurpose {
    /// Open a passphrase-protected history
    Unlock,
    /// Choose a new passphrase
    Create,
    /// Repeat the new passphrase
    Confirm,
}

/// Destructive actions that need a yes/no
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Delete the stored history
    ClearHistory,
}

/// Async capability for asking the user something
#[async_trait]
pub trait UserPrompt: Send + Sync {
    /// Ask for a passphrase; `None` if the user cancelled
    async fn request_passphrase(&self, purpose: PassphrasePurpose) -> Option<String>;

    /// Ask for confirmation
    async fn confirm(&self, action: ConfirmAction) -> bool;
}

/// A prompt that replays queued answers
///
/// Unanswered passphrase requests return `None`; unanswered confirmations
/// return `false`.
#[derive(Default)]
pub struct ScriptedPrompt {
    passphrases: Mutex<VecDeque<Option<String>>>,
    confirmations: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<PassphrasePurpose>>,
}

impl ScriptedPrompt {
    /// Empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a passphrase answer
    pub fn with_passphrase(self, passphrase: impl Into<String>) -> Self {
        self.push_passphrase(Some(passphrase.into()));
        self
    }

    /// Queue a cancelled passphrase prompt
    pub fn with_cancel(self) -> Self {
        self.push_passphrase(None);
        self
    }

    /// Queue a confirmation answer
    pub fn with_confirmation(self, answer: bool) -> Self {
        self.confirmations.lock().push_back(answer);
        self
    }

    /// Queue a passphrase answer on a shared prompt
    pub fn push_passphrase(&self, answer: Option<String>) {
        self.passphrases.lock().push_back(answer);
    }

    /// Queue a confirmation answer on a shared prompt
    pub fn push_confirmation(&self, answer: bool) {
        self.confirmations.lock().push_back(answer);
    }

    /// Passphrase prompts shown so far
    pub fn asked(&self) -> Vec<PassphrasePurpose> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl UserPrompt for ScriptedPrompt {
    async fn request_passphrase(&self, purpose: PassphrasePurpose) -> Option<String> {
        self.asked.lock().push(purpose);
        self.passphrases.lock().pop_front().flatten()
    }

    async fn confirm(&self, _action: ConfirmAction) -> bool {
        self.confirmations.lock().pop_front().unwrap_or(false)
    }
}
