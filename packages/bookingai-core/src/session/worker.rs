//! # Save Worker
//!
//! Single task that owns the active key and performs every storage write for
//! one conversation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SAVE PIPELINE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  controller ──(unbounded mpsc, FIFO)──►  SaveWorker                    │
//! │                                                                         │
//! │    Save(snapshot)     seal under active key, overwrite envelope        │
//! │    Upgrade{..}        salt → envelope(passphrase) → drop device key    │
//! │    Unlock{..}         adopt reopened key, write merged snapshot        │
//! │    Clear              delete all slots, forget key                     │
//! │    Flush              reply once everything before it is done          │
//! │    Shutdown           drain, reply, exit                               │
//! │                                                                         │
//! │  Every snapshot is the full log at enqueue time, and commands run in   │
//! │  order, so a later state is never overwritten by an earlier one.       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::conversation::ConversationLog;
use crate::crypto::{ChatKey, Salt};
use crate::error::{Error, Result};
use crate::storage::{ensure_key, HistoryStore, ProtectionMode, StoredEnvelope};

/// Key the worker seals with
pub(crate) enum Protection {
    /// Device key; `None` until the first save creates or loads it
    Device(Option<ChatKey>),
    /// Passphrase-derived key and the salt it was derived with
    Passphrase { key: ChatKey, salt: Salt },
    /// Stored history was not opened; nothing is written
    Locked,
}

pub(crate) enum Command {
    Save(ConversationLog),
    Upgrade {
        key: ChatKey,
        salt: Salt,
        snapshot: ConversationLog,
        reply: oneshot::Sender<Result<()>>,
    },
    Unlock {
        protection: Protection,
        snapshot: ConversationLog,
        reply: oneshot::Sender<Result<()>>,
    },
    Clear {
        reply: oneshot::Sender<Result<()>>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct SaveWorker {
    history: HistoryStore,
    protection: Protection,
}

impl SaveWorker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Save(snapshot) => {
                    if let Err(e) = self.save(&snapshot) {
                        tracing::warn!(
                            storage_id = %self.history.storage_id(),
                            code = e.code(),
                            error = %e,
                            "Failed to save chat history"
                        );
                    }
                }
                Command::Upgrade {
                    key,
                    salt,
                    snapshot,
                    reply,
                } => {
                    let _ = reply.send(self.upgrade(key, salt, &snapshot));
                }
                Command::Unlock {
                    protection,
                    snapshot,
                    reply,
                } => {
                    self.protection = protection;
                    let result = self.save(&snapshot);
                    if let Err(e) = &result {
                        tracing::warn!(error = %e, "Unlocked history could not be re-saved");
                    }
                    let _ = reply.send(result);
                }
                Command::Clear { reply } => {
                    self.protection = Protection::Device(None);
                    let _ = reply.send(self.history.clear());
                }
                Command::Flush { reply } => {
                    let _ = reply.send(());
                }
                Command::Shutdown { reply } => {
                    let _ = reply.send(());
                    break;
                }
            }
        }

        tracing::debug!(storage_id = %self.history.storage_id(), "Save worker stopped");
    }

    fn save(&mut self, snapshot: &ConversationLog) -> Result<()> {
        let (mode, key) = match &mut self.protection {
            Protection::Locked => {
                tracing::debug!("History is locked, skipping save");
                return Ok(());
            }
            Protection::Device(slot) => (
                ProtectionMode::Key,
                &*slot.get_or_insert_with(|| ensure_key(&self.history)),
            ),
            Protection::Passphrase { key, .. } => (ProtectionMode::Passphrase, &*key),
        };

        let plaintext = snapshot.to_json()?;
        let envelope = StoredEnvelope::seal(mode, key, &plaintext)?;
        self.history.save(&envelope)?;

        tracing::debug!(
            storage_id = %self.history.storage_id(),
            messages = snapshot.len(),
            mode = %mode,
            "Saved chat history"
        );
        Ok(())
    }

    /// Switch to a passphrase key
    ///
    /// The device key slot is only removed after the passphrase envelope
    /// has been written. On failure the previous protection stays active.
    fn upgrade(&mut self, key: ChatKey, salt: Salt, snapshot: &ConversationLog) -> Result<()> {
        let envelope = snapshot
            .to_json()
            .and_then(|plaintext| StoredEnvelope::seal(ProtectionMode::Passphrase, &key, &plaintext))?;

        if let Err(e) = self.history.store_salt(&salt) {
            tracing::error!(error = %e, "Failed to store passphrase salt");
            return Err(e);
        }

        if let Err(e) = self.history.save(&envelope) {
            tracing::error!(error = %e, "Failed to write passphrase envelope");
            // The old envelope is still in place; put back the salt it needs.
            let restored = match &self.protection {
                Protection::Passphrase { salt: previous, .. } => self.history.store_salt(previous),
                Protection::Device(_) | Protection::Locked => self.history.remove_salt().map(|_| ()),
            };
            if let Err(restore) = restored {
                tracing::error!(error = %restore, "Failed to restore previous salt slot");
            }
            return Err(e);
        }

        if let Err(e) = self.history.remove_device_key() {
            tracing::error!(error = %e, "Passphrase envelope written but device key could not be removed");
        }

        self.protection = Protection::Passphrase { key, salt };
        tracing::info!(storage_id = %self.history.storage_id(), "Chat history secured with passphrase");
        Ok(())
    }
}

/// Controller-side handle to the save worker
pub(crate) struct WorkerHandle {
    tx: mpsc::UnboundedSender<Command>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerHandle {
    /// Spawn a worker on the current runtime
    pub(crate) fn spawn(history: HistoryStore, protection: Protection) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = SaveWorker {
            history,
            protection,
        };
        let join = tokio::spawn(worker.run(rx));

        Self {
            tx,
            join: Mutex::new(Some(join)),
        }
    }

    /// Enqueue a command without waiting
    pub(crate) fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::ShutdownInProgress)
    }

    /// Wait for a reply channel handed to the worker
    pub(crate) async fn wait<T>(rx: oneshot::Receiver<T>) -> Result<T> {
        rx.await.map_err(|_| Error::ShutdownInProgress)
    }

    /// Wait for every command queued so far
    pub(crate) async fn flush(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Flush { reply })?;
        Self::wait(rx).await
    }

    /// Drain the queue and stop the worker
    pub(crate) async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply })?;
        Self::wait(rx).await?;

        let join = self.join.lock().take();
        if let Some(join) = join {
            join.await
                .map_err(|e| Error::Internal(format!("save worker panicked: {}", e)))?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ChatMessage;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn log_with(texts: &[&str]) -> ConversationLog {
        let mut log = ConversationLog::with_greeting("hello");
        for text in texts {
            log.push(ChatMessage::user(*text));
        }
        log
    }

    fn read_log(kv: &Arc<MemoryStore>, key: &ChatKey) -> ConversationLog {
        let history = HistoryStore::new(kv.clone(), "u1");
        let envelope = history.load().unwrap().unwrap();
        ConversationLog::from_json(&envelope.open(key).unwrap(), "hello").unwrap()
    }

    #[tokio::test]
    async fn test_saves_apply_in_order() {
        let kv = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(kv.clone(), "u1");
        let key = ChatKey::generate();
        let worker = WorkerHandle::spawn(history, Protection::Device(Some(key.clone())));

        for n in 1..=20 {
            let texts: Vec<String> = (1..=n).map(|i| format!("m{}", i)).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            worker.send(Command::Save(log_with(&refs))).unwrap();
        }
        worker.flush().await.unwrap();

        let log = read_log(&kv, &key);
        assert_eq!(log.len(), 21);
        assert_eq!(log.messages()[20].content, "m20");
    }

    #[tokio::test]
    async fn test_lazy_device_key() {
        let kv = Arc::new(MemoryStore::new());
        let worker = WorkerHandle::spawn(HistoryStore::new(kv.clone(), "u1"), Protection::Device(None));

        assert!(!kv.contains("chat_key_u1").unwrap());
        worker.send(Command::Save(log_with(&["hi"]))).unwrap();
        worker.flush().await.unwrap();

        let key = ChatKey::import(&kv.get("chat_key_u1").unwrap().unwrap()).unwrap();
        assert_eq!(read_log(&kv, &key).len(), 2);
    }

    #[tokio::test]
    async fn test_locked_skips_writes() {
        let kv = Arc::new(MemoryStore::new());
        let worker = WorkerHandle::spawn(HistoryStore::new(kv.clone(), "u1"), Protection::Locked);

        worker.send(Command::Save(log_with(&["hi"]))).unwrap();
        worker.flush().await.unwrap();

        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_failed_upgrade_keeps_device_key() {
        // Room for the device key and the salt, not for an envelope
        let kv = Arc::new(MemoryStore::with_quota(120));
        let history = HistoryStore::new(kv.clone(), "u1");
        let device_key = ensure_key(&history);
        let worker = WorkerHandle::spawn(history, Protection::Device(Some(device_key.clone())));

        let (reply, rx) = oneshot::channel();
        worker
            .send(Command::Upgrade {
                key: ChatKey::generate(),
                salt: Salt::generate(),
                snapshot: log_with(&["Find me a luxury hotel in Paris"]),
                reply,
            })
            .unwrap();
        let result = WorkerHandle::wait(rx).await.unwrap();

        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
        assert!(!kv.contains("chat_storage_u1").unwrap());
        assert!(!kv.contains("chat_storage_u1_salt").unwrap());
        let stored = kv.get("chat_key_u1").unwrap().unwrap();
        assert_eq!(ChatKey::import(&stored).unwrap(), device_key);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let kv = Arc::new(MemoryStore::new());
        let key = ChatKey::generate();
        let worker = WorkerHandle::spawn(
            HistoryStore::new(kv.clone(), "u1"),
            Protection::Device(Some(key.clone())),
        );

        worker.send(Command::Save(log_with(&["last words"]))).unwrap();
        worker.shutdown().await.unwrap();

        assert_eq!(read_log(&kv, &key).messages()[1].content, "last words");
        assert!(matches!(
            worker.send(Command::Save(log_with(&[]))),
            Err(Error::ShutdownInProgress)
        ));
    }
}
