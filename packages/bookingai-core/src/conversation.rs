//! # Conversation Model
//!
//! Messages exchanged with the travel assistant and the ordered log that gets
//! encrypted and persisted.
//!
//! ## Serialized Form
//!
//! ```text
//! [
//!   { "id": "5f0c…", "role": "assistant", "content": "Hi! …",
//!     "timestamp": "2026-03-14T09:30:00Z" },
//!   { "id": "9a1e…", "role": "user", "content": "Hotels in Paris?",
//!     "timestamp": "2026-03-14T09:30:12Z" }
//! ]
//! ```
//!
//! A log is never empty: it starts with the greeting, and restoring an empty
//! list leaves the greeting in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting
    User,
    /// The travel assistant
    Assistant,
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message id (UUID v4)
    pub id: String,
    /// Author
    pub role: Role,
    /// Text content
    pub content: String,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: crate::time::now(),
        }
    }

    /// Message from the user
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Message from the assistant
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered, never-empty list of messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
}

impl ConversationLog {
    /// A log holding only the greeting
    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(greeting)],
        }
    }

    /// Rebuild a log from decrypted messages
    ///
    /// An empty list yields the greeting-only log.
    pub fn restore(messages: Vec<ChatMessage>, greeting: &str) -> Self {
        if messages.is_empty() {
            Self::with_greeting(greeting)
        } else {
            Self { messages }
        }
    }

    /// Append a message at the end
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Messages in insertion order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialize to the JSON array that gets sealed
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.messages)?)
    }

    /// Parse a decrypted JSON array
    pub fn from_json(bytes: &[u8], greeting: &str) -> Result<Self> {
        let messages: Vec<ChatMessage> = serde_json::from_slice(bytes)
            .map_err(|e| Error::DeserializationError(format!("conversation log: {}", e)))?;
        Ok(Self::restore(messages, greeting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: &str = "Hi! How can I help?";

    #[test]
    fn test_message_ids_unique() {
        let a = ChatMessage::user("one");
        let b = ChatMessage::user("one");
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
    }

    #[test]
    fn test_json_preserves_order() {
        let mut log = ConversationLog::with_greeting(GREETING);
        log.push(ChatMessage::user("Find me a hotel in Paris"));
        log.push(ChatMessage::assistant("Here are three options"));

        let bytes = log.to_json().unwrap();
        let restored = ConversationLog::from_json(&bytes, GREETING).unwrap();

        assert_eq!(restored, log);
        assert_eq!(restored.messages()[1].content, "Find me a hotel in Paris");
    }

    #[test]
    fn test_empty_restore_keeps_greeting() {
        let log = ConversationLog::from_json(b"[]", GREETING).unwrap();

        assert_eq!(log.len(), 1);
        assert!(!log.is_empty());
        assert_eq!(log.messages()[0].role, Role::Assistant);
        assert_eq!(log.messages()[0].content, GREETING);
    }

    #[test]
    fn test_garbage_rejected() {
        let result = ConversationLog::from_json(b"{\"not\":\"a list\"}", GREETING);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_parses_frontend_timestamps() {
        let json = br#"[{"id":"1","role":"user","content":"hi","timestamp":"2024-05-01T10:15:30.123Z"}]"#;
        let log = ConversationLog::from_json(json, GREETING).unwrap();
        assert_eq!(log.messages()[0].id, "1");
    }
}
