//! Runtime configuration for the chat core.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BOOKINGAI_API_BASE_URL` | `http://localhost:8000` |
//! | `BOOKINGAI_REQUEST_TIMEOUT_SECS` | `30` |

use std::env;
use std::time::Duration;

/// Backend URL used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Timeout for identity and assistant requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// First assistant message of every conversation
pub const DEFAULT_GREETING: &str = "Hi! I'm your AI travel assistant. I can help you find the perfect hotel, plan your trip, or answer any questions about destinations. How can I assist you today?";

/// Chat core configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the BookingAI backend, without a trailing slash
    pub api_base_url: String,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Greeting a fresh conversation starts with
    pub greeting: String,
}

impl ChatConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let api_base_url = env::var("BOOKINGAI_API_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout_secs = env::var("BOOKINGAI_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            api_base_url: normalize_base_url(&api_base_url),
            request_timeout: Duration::from_secs(timeout_secs),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }

    /// Override the backend URL
    pub fn with_api_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.api_base_url = normalize_base_url(url.as_ref());
        self
    }

    /// Override the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Join a path onto the backend URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
