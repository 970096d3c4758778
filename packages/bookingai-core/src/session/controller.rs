//! # Conversation Controller
//!
//! Owns one identity's conversation: the in-memory log, the protection mode
//! and the save worker.
//!
//! ## Load Decision
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         INIT / LOAD                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  load chat_storage_<id>                                                │
//! │     │                                                                   │
//! │     ├── none ───────────► ensure device key    → Fresh      (Key)      │
//! │     │                                                                   │
//! │     ├── mode = key ─────► ensure device key, open                      │
//! │     │                        ├── ok          → Restored   (Key)        │
//! │     │                        └── fail        → Unreadable (Key)        │
//! │     │                                                                   │
//! │     ├── mode = passphrase ► prompt(Unlock), derive with stored salt    │
//! │     │                        ├── ok          → Restored   (Passphrase) │
//! │     │                        └── cancel/fail → Locked     (Locked)     │
//! │     │                                                                   │
//! │     ├── unparseable ────► ensure device key    → Unreadable (Key)      │
//! │     │                                                                   │
//! │     └── read failed ────► no key, no writes    → Unavailable (Locked)  │
//! │                                                                         │
//! │  The device key slot is never touched while a passphrase envelope     │
//! │  exists.                                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mode Transitions
//!
//! ```text
//!   Key ──secure_with_passphrase──► Passphrase ──clear_history──► Key
//!   Locked ──unlock──► Passphrase, or Key after an Unavailable load
//!   Locked ──clear_history──► Key
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::oneshot;

use super::worker::{Command, Protection, WorkerHandle};
use crate::assistant::Assistant;
use crate::config::ChatConfig;
use crate::conversation::{ChatMessage, ConversationLog, Role};
use crate::crypto::{derive_from_passphrase_blocking, generate_salt, ChatKey, Salt};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::prompt::{ConfirmAction, PassphrasePurpose, UserPrompt};
use crate::storage::{ensure_key, HistoryStore, KeyValueStore, ProtectionMode, StoredEnvelope};

/// How an initialized conversation is protected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyMode {
    /// Device key
    Key,
    /// Passphrase-derived key
    Passphrase,
    /// Stored history not opened; nothing is persisted
    Locked,
}

/// Lifecycle state of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Not initialized, or torn down
    Uninitialized,
    /// Loading stored history
    Loading,
    /// Accepting messages
    Ready(ReadyMode),
}

/// What happened to stored history during init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored
    Fresh,
    /// Stored history was decrypted
    Restored,
    /// Passphrase history was not unlocked
    Locked,
    /// Stored history could not be read and will be overwritten
    Unreadable,
    /// Storage failed to answer; history is kept in memory until unlocked
    Unavailable,
}

/// One identity's conversation
pub struct ConversationController {
    identity: Identity,
    history: HistoryStore,
    prompt: Arc<dyn UserPrompt>,
    config: ChatConfig,
    log: RwLock<ConversationLog>,
    state: RwLock<ControllerState>,
    outcome: LoadOutcome,
    worker: WorkerHandle,
}

impl ConversationController {
    /// Load `identity`'s history and start the save worker
    pub async fn init(
        kv: Arc<dyn KeyValueStore>,
        identity: Identity,
        prompt: Arc<dyn UserPrompt>,
        config: ChatConfig,
    ) -> Result<Self> {
        let history = HistoryStore::new(kv, identity.storage_id());
        let greeting = config.greeting.clone();

        let (log, protection, mode, outcome) = match history.load() {
            Ok(None) => {
                let key = ensure_key(&history);
                (
                    ConversationLog::with_greeting(&greeting),
                    Protection::Device(Some(key)),
                    ReadyMode::Key,
                    LoadOutcome::Fresh,
                )
            }
            Ok(Some(envelope)) if envelope.mode == ProtectionMode::Key => match history.load_device_key() {
                Ok(_) => {
                    let key = ensure_key(&history);
                    let (log, outcome) = open_log(&envelope, &key, &greeting);
                    (log, Protection::Device(Some(key)), ReadyMode::Key, outcome)
                }
                Err(e) => unavailable(&e, &greeting),
            },
            Ok(Some(envelope)) => match unlock_envelope(&history, &envelope, prompt.as_ref(), &greeting).await {
                Some((log, key, salt)) => (
                    log,
                    Protection::Passphrase { key, salt },
                    ReadyMode::Passphrase,
                    LoadOutcome::Restored,
                ),
                None => (
                    ConversationLog::with_greeting(&greeting),
                    Protection::Locked,
                    ReadyMode::Locked,
                    LoadOutcome::Locked,
                ),
            },
            Err(e @ Error::StorageCorrupted(_)) => {
                tracing::warn!(code = e.code(), error = %e, "Stored history is unreadable, starting over");
                let key = ensure_key(&history);
                (
                    ConversationLog::with_greeting(&greeting),
                    Protection::Device(Some(key)),
                    ReadyMode::Key,
                    LoadOutcome::Unreadable,
                )
            }
            Err(e) => unavailable(&e, &greeting),
        };

        tracing::info!(
            identity = %identity,
            messages = log.len(),
            mode = ?mode,
            outcome = ?outcome,
            "Conversation ready"
        );

        Ok(Self {
            identity,
            worker: WorkerHandle::spawn(history.clone(), protection),
            history,
            prompt,
            config,
            log: RwLock::new(log),
            state: RwLock::new(ControllerState::Ready(mode)),
            outcome,
        })
    }

    /// Owner of this conversation
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Current lifecycle state
    pub fn state(&self) -> ControllerState {
        *self.state.read()
    }

    /// Protection mode, `None` once torn down
    pub fn mode(&self) -> Option<ReadyMode> {
        match self.state() {
            ControllerState::Ready(mode) => Some(mode),
            _ => None,
        }
    }

    /// Result of loading stored history
    pub fn load_outcome(&self) -> LoadOutcome {
        self.outcome
    }

    /// Copy of the messages in order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.log.read().messages().to_vec()
    }

    /// Append a message and queue a save; returns without waiting for it
    pub fn append(&self, role: Role, content: impl Into<String>) -> ChatMessage {
        let message = ChatMessage::new(role, content);
        let mut log = self.log.write();
        log.push(message.clone());

        // Enqueued under the log lock so queue order matches log order
        if let Err(e) = self.worker.send(Command::Save(log.clone())) {
            tracing::warn!(error = %e, "Message kept in memory only");
        }
        message
    }

    /// Send user text and append the assistant's answer
    ///
    /// Returns the assistant message.
    pub async fn send(&self, text: &str, assistant: &Assistant) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }

        self.append(Role::User, text);
        let reply = assistant.reply(text).await;
        Ok(self.append(Role::Assistant, reply.content))
    }

    /// Protect the history with a new passphrase
    ///
    /// Cancelled, empty or mismatched entries leave storage untouched.
    pub async fn secure_with_passphrase(&self) -> Result<()> {
        if self.mode() == Some(ReadyMode::Locked) {
            return Err(Error::HistoryLocked);
        }

        let passphrase = self
            .prompt
            .request_passphrase(PassphrasePurpose::Create)
            .await
            .ok_or(Error::PromptCancelled)?;
        if passphrase.is_empty() {
            return Err(Error::EmptyPassphrase);
        }

        let confirmation = self
            .prompt
            .request_passphrase(PassphrasePurpose::Confirm)
            .await
            .ok_or(Error::PromptCancelled)?;
        if confirmation != passphrase {
            return Err(Error::PassphraseMismatch);
        }

        let salt = generate_salt();
        let key = derive_from_passphrase_blocking(passphrase, salt).await?;

        let rx = {
            let log = self.log.read();
            let (reply, rx) = oneshot::channel();
            self.worker.send(Command::Upgrade {
                key,
                salt,
                snapshot: log.clone(),
                reply,
            })?;
            rx
        };
        WorkerHandle::wait(rx).await??;

        self.set_mode(ReadyMode::Passphrase);
        Ok(())
    }

    /// Retry opening a locked history
    ///
    /// Covers both a passphrase history that was not unlocked and storage
    /// that could not be read at init. On success the stored messages are
    /// restored, followed by anything typed while locked. Does nothing if
    /// the history is not locked.
    pub async fn unlock(&self) -> Result<()> {
        if self.mode() != Some(ReadyMode::Locked) {
            return Ok(());
        }

        let greeting = &self.config.greeting;
        let (restored, protection, mode) = match self.history.load()? {
            None => (
                ConversationLog::with_greeting(greeting),
                Protection::Device(None),
                ReadyMode::Key,
            ),
            Some(envelope) if envelope.mode == ProtectionMode::Key => {
                self.history.load_device_key()?;
                let key = ensure_key(&self.history);
                let (log, _) = open_log(&envelope, &key, greeting);
                (log, Protection::Device(Some(key)), ReadyMode::Key)
            }
            Some(envelope) => {
                let salt = self
                    .history
                    .load_salt()?
                    .ok_or_else(|| Error::StorageCorrupted("passphrase salt is missing".into()))?;

                let passphrase = self
                    .prompt
                    .request_passphrase(PassphrasePurpose::Unlock)
                    .await
                    .ok_or(Error::PromptCancelled)?;
                let key = derive_from_passphrase_blocking(passphrase, salt).await?;
                let plaintext = envelope.open(&key)?;
                let log = ConversationLog::from_json(&plaintext, greeting)?;
                (log, Protection::Passphrase { key, salt }, ReadyMode::Passphrase)
            }
        };

        let rx = {
            let mut log = self.log.write();
            let mut merged = restored;
            // Index 0 is the placeholder greeting shown while locked
            for message in log.messages().iter().skip(1) {
                merged.push(message.clone());
            }
            *log = merged;

            let (reply, rx) = oneshot::channel();
            self.worker.send(Command::Unlock {
                protection,
                snapshot: log.clone(),
                reply,
            })?;
            rx
        };

        self.set_mode(mode);
        tracing::info!(identity = %self.identity, mode = ?mode, "Chat history unlocked");

        if let Err(e) = WorkerHandle::wait(rx).await? {
            tracing::warn!(error = %e, "Unlocked history will be saved on the next message");
        }
        Ok(())
    }

    /// Delete stored history after confirmation
    ///
    /// Returns `Ok(false)` if the user declined.
    pub async fn clear_history(&self) -> Result<bool> {
        if !self.prompt.confirm(ConfirmAction::ClearHistory).await {
            return Ok(false);
        }

        let rx = {
            let mut log = self.log.write();
            *log = ConversationLog::with_greeting(&self.config.greeting);

            let (reply, rx) = oneshot::channel();
            self.worker.send(Command::Clear { reply })?;
            rx
        };

        // Storage is reset to device mode even if a delete failed
        self.set_mode(ReadyMode::Key);
        WorkerHandle::wait(rx).await??;

        tracing::info!(identity = %self.identity, "Chat history cleared");
        Ok(true)
    }

    /// Wait for all queued saves
    pub async fn flush(&self) -> Result<()> {
        self.worker.flush().await
    }

    /// Flush and stop the save worker
    pub async fn teardown(&self) -> Result<()> {
        self.worker.shutdown().await?;
        *self.state.write() = ControllerState::Uninitialized;
        tracing::info!(identity = %self.identity, "Conversation closed");
        Ok(())
    }

    fn set_mode(&self, mode: ReadyMode) {
        *self.state.write() = ControllerState::Ready(mode);
    }
}

/// Start locked without touching storage after a failed read
fn unavailable(error: &Error, greeting: &str) -> (ConversationLog, Protection, ReadyMode, LoadOutcome) {
    tracing::warn!(code = error.code(), error = %error, "Storage is unavailable, keeping history in memory");
    (
        ConversationLog::with_greeting(greeting),
        Protection::Locked,
        ReadyMode::Locked,
        LoadOutcome::Unavailable,
    )
}

/// Decrypt a key-mode envelope into a log
fn open_log(envelope: &StoredEnvelope, key: &ChatKey, greeting: &str) -> (ConversationLog, LoadOutcome) {
    match envelope
        .open(key)
        .and_then(|plaintext| ConversationLog::from_json(&plaintext, greeting))
    {
        Ok(log) => (log, LoadOutcome::Restored),
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, "Could not open stored history");
            (ConversationLog::with_greeting(greeting), LoadOutcome::Unreadable)
        }
    }
}

/// Ask for the passphrase and open a passphrase envelope
///
/// `None` covers a declined prompt, a missing salt and a wrong passphrase.
async fn unlock_envelope(
    history: &HistoryStore,
    envelope: &StoredEnvelope,
    prompt: &dyn UserPrompt,
    greeting: &str,
) -> Option<(ConversationLog, ChatKey, Salt)> {
    let salt = match history.load_salt() {
        Ok(Some(salt)) => salt,
        Ok(None) => {
            tracing::error!("Passphrase history has no salt");
            return None;
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not read passphrase salt");
            return None;
        }
    };

    let Some(passphrase) = prompt.request_passphrase(PassphrasePurpose::Unlock).await else {
        tracing::info!("Passphrase prompt declined, history stays locked");
        return None;
    };

    let result = async {
        let key = derive_from_passphrase_blocking(passphrase, salt).await?;
        let plaintext = envelope.open(&key)?;
        let log = ConversationLog::from_json(&plaintext, greeting)?;
        Ok::<_, Error>((log, key))
    }
    .await;

    match result {
        Ok((log, key)) => Some((log, key, salt)),
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, "Could not unlock stored history");
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use crate::storage::MemoryStore;

    fn config() -> ChatConfig {
        ChatConfig::from_env()
    }

    async fn controller(
        kv: &Arc<MemoryStore>,
        prompt: Arc<ScriptedPrompt>,
    ) -> ConversationController {
        ConversationController::init(kv.clone(), Identity::user("u1"), prompt, config())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_init() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new())).await;

        assert_eq!(ctrl.load_outcome(), LoadOutcome::Fresh);
        assert_eq!(ctrl.state(), ControllerState::Ready(ReadyMode::Key));
        assert_eq!(ctrl.messages().len(), 1);
        assert_eq!(ctrl.messages()[0].content, config().greeting);
        assert!(kv.contains("chat_key_u1").unwrap());
    }

    #[tokio::test]
    async fn test_send_rejects_blank() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new())).await;

        let result = ctrl.send("   \n", &Assistant::offline()).await;
        assert!(matches!(result, Err(Error::EmptyMessage)));
        assert_eq!(ctrl.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_send_appends_both_sides() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new())).await;

        let reply = ctrl
            .send("  Recommend hotels for families ", &Assistant::offline())
            .await
            .unwrap();

        let messages = ctrl.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Recommend hotels for families");
        assert_eq!(messages[2], reply);
        assert!(reply.content.contains("Dubai Marina"));
    }

    #[tokio::test]
    async fn test_key_mode_reload() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new())).await;
        ctrl.append(Role::User, "one");
        ctrl.append(Role::Assistant, "two");
        ctrl.teardown().await.unwrap();
        assert_eq!(ctrl.state(), ControllerState::Uninitialized);

        let reloaded = controller(&kv, Arc::new(ScriptedPrompt::new())).await;
        assert_eq!(reloaded.load_outcome(), LoadOutcome::Restored);
        assert_eq!(reloaded.messages(), ctrl.messages());
    }

    #[tokio::test]
    async fn test_missing_device_key_is_unreadable() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new())).await;
        ctrl.append(Role::User, "lost");
        ctrl.teardown().await.unwrap();

        kv.remove("chat_key_u1").unwrap();

        let reloaded = controller(&kv, Arc::new(ScriptedPrompt::new())).await;
        assert_eq!(reloaded.load_outcome(), LoadOutcome::Unreadable);
        assert_eq!(reloaded.mode(), Some(ReadyMode::Key));
        assert_eq!(reloaded.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupted_envelope_starts_over() {
        let kv = Arc::new(MemoryStore::new());
        kv.set("chat_storage_u1", "<html>").unwrap();

        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new())).await;

        assert_eq!(ctrl.load_outcome(), LoadOutcome::Unreadable);
        assert_eq!(ctrl.mode(), Some(ReadyMode::Key));
    }

    #[tokio::test]
    async fn test_secure_cancel_and_mismatch_leave_storage() {
        let kv = Arc::new(MemoryStore::new());
        let prompt = Arc::new(
            ScriptedPrompt::new()
                .with_cancel()
                .with_passphrase("")
                .with_passphrase("sunset")
                .with_passphrase("sunrise"),
        );
        let ctrl = controller(&kv, prompt).await;
        ctrl.append(Role::User, "hi");
        ctrl.flush().await.unwrap();
        let before = kv.get("chat_storage_u1").unwrap();

        assert!(matches!(ctrl.secure_with_passphrase().await, Err(Error::PromptCancelled)));
        assert!(matches!(ctrl.secure_with_passphrase().await, Err(Error::EmptyPassphrase)));
        assert!(matches!(ctrl.secure_with_passphrase().await, Err(Error::PassphraseMismatch)));

        ctrl.flush().await.unwrap();
        assert_eq!(kv.get("chat_storage_u1").unwrap(), before);
        assert!(kv.contains("chat_key_u1").unwrap());
        assert!(!kv.contains("chat_storage_u1_salt").unwrap());
        assert_eq!(ctrl.mode(), Some(ReadyMode::Key));
    }

    #[tokio::test]
    async fn test_locked_session_unlocks_and_merges() {
        let kv = Arc::new(MemoryStore::new());
        let prompt = Arc::new(
            ScriptedPrompt::new()
                .with_passphrase("harbour-view")
                .with_passphrase("harbour-view"),
        );
        let ctrl = controller(&kv, prompt).await;
        ctrl.append(Role::User, "before lock");
        ctrl.secure_with_passphrase().await.unwrap();
        ctrl.teardown().await.unwrap();

        // Decline at load, then unlock later
        let prompt = Arc::new(ScriptedPrompt::new().with_cancel());
        let locked = controller(&kv, prompt.clone()).await;
        assert_eq!(locked.load_outcome(), LoadOutcome::Locked);
        assert_eq!(locked.mode(), Some(ReadyMode::Locked));
        assert!(matches!(
            locked.secure_with_passphrase().await,
            Err(Error::HistoryLocked)
        ));

        let envelope_before = kv.get("chat_storage_u1").unwrap();
        locked.append(Role::User, "typed while locked");
        locked.flush().await.unwrap();
        assert_eq!(kv.get("chat_storage_u1").unwrap(), envelope_before);
        assert!(!kv.contains("chat_key_u1").unwrap());

        prompt.push_passphrase(Some("harbour-view".into()));
        locked.unlock().await.unwrap();

        let contents: Vec<String> = locked.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents[1..], ["before lock", "typed while locked"]);
        assert_eq!(locked.mode(), Some(ReadyMode::Passphrase));
        assert!(!kv.contains("chat_key_u1").unwrap());
    }

    #[tokio::test]
    async fn test_unlock_wrong_passphrase_stays_locked() {
        let kv = Arc::new(MemoryStore::new());
        let prompt = Arc::new(
            ScriptedPrompt::new()
                .with_passphrase("correct")
                .with_passphrase("correct"),
        );
        let ctrl = controller(&kv, prompt).await;
        ctrl.secure_with_passphrase().await.unwrap();
        ctrl.teardown().await.unwrap();

        let prompt = Arc::new(ScriptedPrompt::new().with_cancel().with_passphrase("wrong"));
        let locked = controller(&kv, prompt).await;

        assert!(matches!(locked.unlock().await, Err(Error::DecryptionFailed(_))));
        assert_eq!(locked.mode(), Some(ReadyMode::Locked));
    }

    #[tokio::test]
    async fn test_clear_declined() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new().with_confirmation(false))).await;
        ctrl.append(Role::User, "keep me");

        assert!(!ctrl.clear_history().await.unwrap());
        assert_eq!(ctrl.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_save_after_clear_creates_new_device_key() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new().with_confirmation(true))).await;
        let old_key = kv.get("chat_key_u1").unwrap();

        assert!(ctrl.clear_history().await.unwrap());
        assert!(!kv.contains("chat_key_u1").unwrap());

        ctrl.append(Role::User, "new start");
        ctrl.flush().await.unwrap();

        let new_key = kv.get("chat_key_u1").unwrap();
        assert!(new_key.is_some());
        assert_ne!(new_key, old_key);
    }

    #[tokio::test]
    async fn test_append_after_teardown_stays_in_memory() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new())).await;
        ctrl.teardown().await.unwrap();

        ctrl.append(Role::User, "late");

        assert_eq!(ctrl.messages().len(), 2);
        assert!(matches!(ctrl.flush().await, Err(Error::ShutdownInProgress)));
    }

    /// Memory store whose next read of one slot fails
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        failing: parking_lot::Mutex<Option<String>>,
    }

    impl FlakyStore {
        fn failing_once(inner: Arc<MemoryStore>, slot: &str) -> Self {
            Self {
                inner,
                failing: parking_lot::Mutex::new(Some(slot.to_string())),
            }
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            let mut failing = self.failing.lock();
            if failing.as_deref() == Some(key) {
                *failing = None;
                return Err(Error::StorageUnavailable("storage is disabled".into()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<bool> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_read_failure_keeps_passphrase_history() {
        let kv = Arc::new(MemoryStore::new());
        let prompt = Arc::new(
            ScriptedPrompt::new()
                .with_passphrase("rooftop-pool")
                .with_passphrase("rooftop-pool"),
        );
        let ctrl = controller(&kv, prompt).await;
        ctrl.append(Role::User, "Show me budget-friendly options");
        ctrl.secure_with_passphrase().await.unwrap();
        ctrl.teardown().await.unwrap();
        let envelope_before = kv.get("chat_storage_u1").unwrap();

        let flaky = Arc::new(FlakyStore::failing_once(kv.clone(), "chat_storage_u1"));
        let prompt = Arc::new(ScriptedPrompt::new().with_passphrase("rooftop-pool"));
        let ctrl = ConversationController::init(flaky, Identity::user("u1"), prompt, config())
            .await
            .unwrap();

        assert_eq!(ctrl.load_outcome(), LoadOutcome::Unavailable);
        assert_eq!(ctrl.mode(), Some(ReadyMode::Locked));

        ctrl.append(Role::User, "typed while storage was down");
        ctrl.flush().await.unwrap();
        assert_eq!(kv.get("chat_storage_u1").unwrap(), envelope_before);
        assert!(!kv.contains("chat_key_u1").unwrap());

        ctrl.unlock().await.unwrap();
        assert_eq!(ctrl.mode(), Some(ReadyMode::Passphrase));
        let contents: Vec<String> = ctrl.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(
            contents[1..],
            ["Show me budget-friendly options", "typed while storage was down"]
        );
        assert!(!kv.contains("chat_key_u1").unwrap());
    }

    #[tokio::test]
    async fn test_device_key_read_failure_keeps_history() {
        let kv = Arc::new(MemoryStore::new());
        let ctrl = controller(&kv, Arc::new(ScriptedPrompt::new())).await;
        ctrl.append(Role::User, "one");
        ctrl.teardown().await.unwrap();
        let key_before = kv.get("chat_key_u1").unwrap();

        let flaky = Arc::new(FlakyStore::failing_once(kv.clone(), "chat_key_u1"));
        let ctrl = ConversationController::init(
            flaky,
            Identity::user("u1"),
            Arc::new(ScriptedPrompt::new()),
            config(),
        )
        .await
        .unwrap();

        assert_eq!(ctrl.load_outcome(), LoadOutcome::Unavailable);
        ctrl.append(Role::User, "two");
        ctrl.flush().await.unwrap();
        assert_eq!(kv.get("chat_key_u1").unwrap(), key_before);

        ctrl.unlock().await.unwrap();
        assert_eq!(ctrl.mode(), Some(ReadyMode::Key));
        let contents: Vec<String> = ctrl.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents[1..], ["one", "two"]);
    }
}
