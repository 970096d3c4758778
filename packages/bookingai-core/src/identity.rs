//! # Identity
//!
//! Decides whose history is being read and written.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        IDENTITY RESOLUTION                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  GET /accounts/api/me/                                                 │
//! │        │                                                                │
//! │        ├── { authenticated: true, user: { id: 42 } }  → Authenticated  │
//! │        │                                                "42"            │
//! │        ├── { authenticated: false }                   → Anonymous      │
//! │        └── network error / bad body                   → Anonymous      │
//! │                                                                         │
//! │  Storage id: escaped user id, or "anonymous"                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::error::{Error, Result};

/// Storage bucket shared by signed-out visitors
pub const ANONYMOUS_BUCKET: &str = "anonymous";

/// Who owns the current conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// A signed-in user
    Authenticated {
        /// Backend user id
        id: String,
    },
    /// No signed-in user
    Anonymous,
}

impl Identity {
    /// Signed-in identity for `id`
    pub fn user(id: impl Into<String>) -> Self {
        Identity::Authenticated { id: id.into() }
    }

    /// Whether a user is signed in
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    /// The id embedded in slot names
    ///
    /// User ids are escaped so that no id can produce another identity's
    /// slot name (for example `u1_salt` would otherwise read `u1`'s salt).
    /// A user whose id is literally `anonymous` gets its first byte escaped
    /// so it never lands in the signed-out bucket.
    pub fn storage_id(&self) -> String {
        match self {
            Identity::Authenticated { id } if id.as_str() == ANONYMOUS_BUCKET => {
                let (first, rest) = id.split_at(1);
                format!("%{:02X}{}", first.as_bytes()[0], rest)
            }
            Identity::Authenticated { id } => escape_storage_id(id),
            Identity::Anonymous => ANONYMOUS_BUCKET.to_string(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::Authenticated { id } => write!(f, "user {}", id),
            Identity::Anonymous => f.write_str("anonymous"),
        }
    }
}

fn escape_storage_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'@' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

// ============================================================================
// /api/me/ RESPONSE
// ============================================================================

/// Body of `GET /accounts/api/me/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Whether the session is signed in
    #[serde(default)]
    pub authenticated: bool,
    /// Profile, present when signed in
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Signed-in user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Numeric or string user id
    pub id: serde_json::Value,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Account role (guest, staff, ...)
    #[serde(default)]
    pub role: Option<String>,
}

impl UserProfile {
    /// User id as text, whether the backend sent a number or a string
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl CurrentUser {
    /// Signed-out response
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Signed-in response for `id`
    pub fn signed_in(id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user: Some(UserProfile {
                id: serde_json::Value::String(id.into()),
                email: None,
                name: None,
                role: None,
            }),
        }
    }

    /// Map the response to an identity
    pub fn identity(&self) -> Identity {
        if !self.authenticated {
            return Identity::Anonymous;
        }
        self.user
            .as_ref()
            .and_then(UserProfile::id_string)
            .map(Identity::user)
            .unwrap_or(Identity::Anonymous)
    }
}

// ============================================================================
// PROVIDERS
// ============================================================================

/// Source of the current user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up the signed-in user
    async fn current_user(&self) -> Result<CurrentUser>;
}

/// Asks the BookingAI backend who is signed in
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpIdentityProvider {
    /// Build a provider for the configured backend
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::IdentityUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            url: config.endpoint("accounts/api/me/"),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn current_user(&self) -> Result<CurrentUser> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::IdentityUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::IdentityUnavailable(format!(
                "{} returned {}",
                self.url,
                resp.status()
            )));
        }

        resp.json::<CurrentUser>()
            .await
            .map_err(|e| Error::IdentityUnavailable(format!("unreadable response: {}", e)))
    }
}

/// Fixed identity, for tests and `--user`
pub struct StaticIdentity(pub Identity);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<CurrentUser> {
        Ok(match &self.0 {
            Identity::Authenticated { id } => CurrentUser::signed_in(id.clone()),
            Identity::Anonymous => CurrentUser::anonymous(),
        })
    }
}

/// Resolve the current identity, falling back to anonymous
pub async fn resolve_identity(provider: &dyn IdentityProvider) -> Identity {
    match provider.current_user().await {
        Ok(user) => {
            let identity = user.identity();
            tracing::debug!(identity = %identity, "Resolved identity");
            identity
        }
        Err(e) => {
            tracing::warn!(error = %e, "Identity lookup failed, using anonymous history");
            Identity::Anonymous
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl IdentityProvider for FailingProvider {
        async fn current_user(&self) -> Result<CurrentUser> {
            Err(Error::IdentityUnavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_storage_ids() {
        assert_eq!(Identity::user("u1").storage_id(), "u1");
        assert_eq!(Identity::user("ana@hotel.test").storage_id(), "ana@hotel.test");
        assert_eq!(Identity::Anonymous.storage_id(), "anonymous");
    }

    #[test]
    fn test_storage_id_escaping_prevents_collisions() {
        // "u1_salt" must not alias u1's salt slot
        assert_eq!(Identity::user("u1_salt").storage_id(), "u1%5Fsalt");
        assert_ne!(
            Identity::user("anonymous").storage_id(),
            Identity::Anonymous.storage_id()
        );
        assert_eq!(Identity::user("anonymous").storage_id(), "%61nonymous");
        assert_ne!(
            Identity::user("anonymous ").storage_id(),
            Identity::Anonymous.storage_id()
        );
    }

    #[test]
    fn test_parse_me_response() {
        let body = r#"{"authenticated":true,"user":{"id":42,"email":"a@b.c","name":"Ana","role":"guest"}}"#;
        let user: CurrentUser = serde_json::from_str(body).unwrap();
        assert_eq!(user.identity(), Identity::user("42"));

        let body = r#"{"authenticated":false}"#;
        let user: CurrentUser = serde_json::from_str(body).unwrap();
        assert_eq!(user.identity(), Identity::Anonymous);
    }

    #[test]
    fn test_authenticated_without_id_is_anonymous() {
        let user = CurrentUser {
            authenticated: true,
            user: None,
        };
        assert_eq!(user.identity(), Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_anonymous() {
        assert_eq!(resolve_identity(&FailingProvider).await, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_static_identity() {
        let provider = StaticIdentity(Identity::user("u7"));
        assert_eq!(resolve_identity(&provider).await, Identity::user("u7"));

        let provider = StaticIdentity(Identity::Anonymous);
        assert_eq!(resolve_identity(&provider).await, Identity::Anonymous);
    }
}
