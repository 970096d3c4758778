//! HTTP client for `POST /api/ai/chat/`.

use async_trait::async_trait;
use serde::Serialize;

use super::{HotelRecord, Preferences, ReplyBackend};
use crate::config::ChatConfig;
use crate::error::{Error, Result};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    preferences: &'a Preferences,
    hotels: &'a [HotelRecord],
}

/// Reply backend served by the BookingAI API
pub struct HttpReplyBackend {
    client: reqwest::Client,
    url: String,
}

impl HttpReplyBackend {
    /// Build a backend for the configured API
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::AssistantUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            url: config.endpoint("api/ai/chat/"),
        })
    }

    /// Endpoint this backend posts to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReplyBackend for HttpReplyBackend {
    async fn generate_reply(
        &self,
        message: &str,
        preferences: &Preferences,
        hotels: &[HotelRecord],
    ) -> Result<String> {
        let request = ChatRequest {
            message,
            preferences,
            hotels,
        };

        let resp = self.client.post(&self.url).json(&request).send().await?;
        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::AssistantUnavailable(format!("unreadable response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::AssistantUnavailable(format!(
                "status {}: {}",
                status,
                error_text(&body).unwrap_or("no error message")
            )));
        }

        parse_reply(&body)
    }
}

fn error_text(body: &serde_json::Value) -> Option<&str> {
    body.get("error").and_then(|e| e.as_str())
}

/// Pull the reply text out of a chat response body
///
/// Accepts `reply`, `response` or `text`; an `error` field wins over all.
fn parse_reply(body: &serde_json::Value) -> Result<String> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let text = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(Error::AssistantUnavailable(text));
    }

    ["reply", "response", "text"]
        .iter()
        .find_map(|field| body.get(*field).and_then(|v| v.as_str()))
        .map(str::to_string)
        .ok_or_else(|| Error::AssistantUnavailable("response has no reply text".into()))
}
