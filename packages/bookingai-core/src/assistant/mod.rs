//! # Assistant Module
//!
//! Produces the assistant's side of the conversation.
//!
//! ## Reply Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          REPLY FLOW                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  user text                                                             │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  ReplyBackend::generate_reply(text, preferences, hotels)               │
//! │      │                                                                  │
//! │      ├── Ok(reply)  ───────────────────────────►  reply                │
//! │      │                                                                  │
//! │      └── Err(e)  → log e  → APOLOGY + canned_reply(text)               │
//! │                                                                         │
//! │  Offline assistants skip the backend and answer from canned replies.   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend error text is never shown to the user.

mod canned;
mod http;
mod payload;

pub use canned::{canned_reply, APOLOGY, SUGGESTED_QUESTIONS};
pub use http::HttpReplyBackend;
pub use payload::{AttributeValue, HotelRecord, Preferences};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Something that can answer a traveller's question
#[async_trait]
pub trait ReplyBackend: Send + Sync {
    /// Generate a reply for `message`
    async fn generate_reply(
        &self,
        message: &str,
        preferences: &Preferences,
        hotels: &[HotelRecord],
    ) -> Result<String>;
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// The backend answered
    Backend,
    /// Canned reply after a backend failure
    Fallback,
    /// Canned reply, no backend configured
    Offline,
}

/// A reply ready to be appended to the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    /// Text shown to the user
    pub content: String,
    /// Origin of the text
    pub source: ReplySource,
}

/// Backend plus canned fallback
pub struct Assistant {
    backend: Option<Arc<dyn ReplyBackend>>,
    preferences: Preferences,
    hotels: Vec<HotelRecord>,
}

impl Assistant {
    /// Assistant backed by `backend`, using default preferences and the
    /// hotel catalog
    pub fn new(backend: Arc<dyn ReplyBackend>) -> Self {
        Self {
            backend: Some(backend),
            preferences: Preferences::leisure_defaults(),
            hotels: HotelRecord::catalog(),
        }
    }

    /// Assistant that only gives canned replies
    pub fn offline() -> Self {
        Self {
            backend: None,
            preferences: Preferences::leisure_defaults(),
            hotels: HotelRecord::catalog(),
        }
    }

    /// Replace the preferences sent with each question
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Replace the hotel list sent with each question
    pub fn with_hotels(mut self, hotels: Vec<HotelRecord>) -> Self {
        self.hotels = hotels;
        self
    }

    /// Whether a backend is configured
    pub fn is_online(&self) -> bool {
        self.backend.is_some()
    }

    /// Answer `message`; never fails
    pub async fn reply(&self, message: &str) -> AssistantReply {
        let Some(backend) = &self.backend else {
            return AssistantReply {
                content: canned_reply(message).to_string(),
                source: ReplySource::Offline,
            };
        };

        match backend
            .generate_reply(message, &self.preferences, &self.hotels)
            .await
        {
            Ok(content) => AssistantReply {
                content,
                source: ReplySource::Backend,
            },
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "Assistant backend failed, using canned reply");
                AssistantReply {
                    content: format!("{} {}", APOLOGY, canned_reply(message)),
                    source: ReplySource::Fallback,
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
