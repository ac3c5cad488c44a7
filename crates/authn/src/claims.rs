//! Signed-token payload.
//!
//! Every token carries the same core claims plus a kind discriminant.
//! Refresh tokens additionally carry [`ExtensionFields`]; access tokens never
//! do, so a leaked access token reveals as little as possible. The two parts
//! are separate structures merged only when the payload is encoded:
//!
//! ```json
//! {
//!   "jti": "7a1c…", "iss": "credcore", "iat": 1700000000, "exp": 1700007200,
//!   "kind": "refresh",
//!   "user_id_hash": "5e88…", "role": "user", "parent_token_id": "19c0…"
//! }
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Distinguishes access from refresh tokens sharing one claims format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, sent with every request.
    Access,
    /// Longer-lived, backed by a stored session and exchanged for a new pair.
    Refresh,
}

/// Standard claims present in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreClaims {
    /// Session identifier, shared by an access/refresh pair.
    pub jti: String,
    /// Issuer.
    pub iss: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration time (seconds since epoch).
    pub exp: i64,
    /// Access or refresh.
    pub kind: TokenKind,
}

/// Session details embedded in refresh tokens only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionFields {
    /// Lowercase hex SHA-256 of the user id.
    pub user_id_hash: String,
    /// User role.
    pub role: String,
    /// Parent session of a delegated token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_token_id: Option<String>,
}

impl ExtensionFields {
    /// Builds extension fields, hashing `user_id`.
    pub fn new(user_id: &str, role: impl Into<String>, parent_token_id: Option<String>) -> Self {
        Self { user_id_hash: hash_user_id(user_id), role: role.into(), parent_token_id }
    }
}

/// The complete payload as it is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Core claims.
    #[serde(flatten)]
    pub core: CoreClaims,
    /// Extension fields, refresh tokens only.
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<ExtensionFields>,
}

impl TokenClaims {
    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.core.jti
    }

    /// Returns the token kind.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.core.kind
    }
}

/// Lowercase hex SHA-256 of `user_id`.
#[must_use]
pub fn hash_user_id(user_id: &str) -> String {
    hex::encode(Sha256::digest(user_id.as_bytes()))
}
