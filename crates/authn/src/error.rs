//! Authentication error types.
//!
//! This module defines errors that can occur while configuring an issuer,
//! loading keys, signing tokens and verifying presented tokens.

use std::{error::Error as StdError, sync::Arc};

use thiserror::Error;

/// Shared boxed error used for `#[source]` chains.
pub type BoxError = Arc<dyn StdError + Send + Sync + 'static>;

/// Issuance and verification errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`. New variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Malformed, forged, expired or otherwise unverifiable token.
    ///
    /// Forged and merely stale tokens are deliberately reported the same way.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Algorithm rejected by the signing policy.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key material could not be parsed or does not fit the algorithm.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signing a token failed.
    #[error("Signing failed: {message}")]
    Signing {
        /// Description of what was being signed.
        message: String,
        /// The underlying encoder error.
        #[source]
        source: Option<BoxError>,
    },

    /// Issuer configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AuthError {
    /// Creates an [`AuthError::InvalidToken`].
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    /// Creates an [`AuthError::UnsupportedAlgorithm`].
    pub fn unsupported_algorithm(message: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm(message.into())
    }

    /// Creates an [`AuthError::InvalidKey`].
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }

    /// Creates an [`AuthError::Signing`] without an underlying cause.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing { message: message.into(), source: None }
    }

    /// Creates an [`AuthError::Signing`] wrapping `source`.
    pub fn signing_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Signing { message: message.into(), source: Some(Arc::new(source)) }
    }
}

/// Rejected issuer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required string field is empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A duration is shorter than allowed.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Name of the offending field.
        field: &'static str,
        /// Smallest accepted value, human readable.
        min: String,
        /// The rejected value, human readable.
        value: String,
    },

    /// Access tokens would outlive the refresh tokens that renew them.
    #[error("access_ttl ({access}) must not exceed refresh_ttl ({refresh})")]
    AccessOutlivesRefresh {
        /// Configured access lifetime, human readable.
        access: String,
        /// Configured refresh lifetime, human readable.
        refresh: String,
    },
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => AuthError::invalid_token("signature mismatch"),
            ErrorKind::ExpiredSignature => AuthError::invalid_token("token expired"),
            ErrorKind::InvalidIssuer => AuthError::invalid_token("issuer mismatch"),
            ErrorKind::InvalidAlgorithm => AuthError::invalid_token("algorithm mismatch"),
            _ => AuthError::InvalidToken(format!("JWT error: {err}")),
        }
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(AuthError::invalid_token("bad").to_string(), "Invalid token: bad");
        assert_eq!(AuthError::invalid_key("short").to_string(), "Invalid key: short");
        assert_eq!(
            AuthError::unsupported_algorithm("HS256").to_string(),
            "Unsupported algorithm: HS256"
        );
    }

    #[test]
    fn test_every_jsonwebtoken_failure_is_invalid_token() {
        use jsonwebtoken::errors::{Error, ErrorKind};

        for kind in [
            ErrorKind::InvalidToken,
            ErrorKind::InvalidSignature,
            ErrorKind::ExpiredSignature,
            ErrorKind::InvalidIssuer,
            ErrorKind::InvalidAlgorithm,
            ErrorKind::ImmatureSignature,
        ] {
            let auth_err: AuthError = Error::from(kind).into();
            assert!(matches!(auth_err, AuthError::InvalidToken(_)), "got {auth_err:?}");
        }
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: AuthError = ConfigError::Empty { field: "issuer" }.into();
        assert_eq!(err.to_string(), "issuer must not be empty");
    }

    #[test]
    fn test_signing_preserves_source_chain() {
        let io = std::io::Error::other("encoder exploded");
        let err = AuthError::signing_with_source("refresh token", io);

        assert_eq!(err.to_string(), "Signing failed: refresh token");
        let source = err.source().expect("source chain must be preserved");
        assert_eq!(source.to_string(), "encoder exploded");
    }
}
