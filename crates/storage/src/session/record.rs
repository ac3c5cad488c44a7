//! Persisted refresh-session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The client signals that identify "the same client session".
///
/// At most one live session exists per identity; creating a new session for
/// an occupied identity evicts the previous one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Short platform string derived from the user agent.
    pub platform: String,
    /// Opaque client fingerprint.
    pub fingerprint: String,
    /// Client IP address as presented by the transport.
    pub ip: String,
}

impl SessionIdentity {
    /// Creates an identity from its three parts.
    pub fn new(platform: impl Into<String>, fingerprint: impl Into<String>, ip: impl Into<String>) -> Self {
        Self { platform: platform.into(), fingerprint: fingerprint.into(), ip: ip.into() }
    }
}

/// One live refresh session.
///
/// Stored under the identifier shared by the session's access and refresh
/// tokens. Access tokens are never stored separately.
///
/// # Examples
///
/// ```
/// use credcore_storage::session::StoredToken;
///
/// let record = StoredToken::builder()
///     .id("4b8f3c1e-0000-4000-8000-000000000000")
///     .user_id("user-1")
///     .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
///     .platform("X11")
///     .fingerprint("fp")
///     .ip("10.0.0.1")
///     .role("user")
///     .build();
///
/// assert!(!record.rw_access);
/// assert!(record.parent_token_id.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct StoredToken {
    /// Session identifier (the `jti` of both tokens).
    #[builder(into)]
    pub id: String,

    /// Owning user.
    #[builder(into)]
    pub user_id: String,

    /// Raw user-agent string.
    #[builder(into)]
    pub user_agent: String,

    /// Platform derived from the user agent.
    #[builder(into)]
    pub platform: String,

    /// Opaque client fingerprint.
    #[builder(into)]
    pub fingerprint: String,

    /// Client IP.
    #[builder(into)]
    pub ip: String,

    /// User role.
    #[builder(into)]
    pub role: String,

    /// Whether the session may write.
    #[builder(default)]
    pub rw_access: bool,

    /// Base64(JSON) namespace grants.
    #[builder(into, default)]
    pub namespace_access: String,

    /// Base64(JSON) volume grants.
    #[builder(into, default)]
    pub volume_access: String,

    /// Parent session for delegated tokens.
    #[builder(into)]
    pub parent_token_id: Option<String>,

    /// When the session was created.
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl StoredToken {
    /// Returns the identity tuple this session occupies.
    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::new(&self.platform, &self.fingerprint, &self.ip)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> StoredToken {
        StoredToken::builder()
            .id("id-1")
            .user_id("u1")
            .user_agent("curl/8.0")
            .platform("curl")
            .fingerprint("fp")
            .ip("127.0.0.1")
            .role("admin")
            .rw_access(true)
            .namespace_access("W10=")
            .parent_token_id("parent")
            .build()
    }

    #[test]
    fn test_identity_projection() {
        let record = sample();
        assert_eq!(record.identity(), SessionIdentity::new("curl", "fp", "127.0.0.1"));
    }

    #[test]
    fn test_json_shape() {
        let record = sample();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["parent_token_id"], "parent");
        assert_eq!(json["volume_access"], "");

        let back: StoredToken = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["extra"] = serde_json::json!(1);
        assert!(serde_json::from_value::<StoredToken>(json).is_err());
    }
}
