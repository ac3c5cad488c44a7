//! Token service error types.

use credcore_authn::AuthError;
use credcore_storage::StorageError;
use thiserror::Error;

/// Failures surfaced by [`TokenService`](crate::TokenService) operations.
///
/// `InvalidToken` deliberately conflates forged, malformed, expired, wrong-kind
/// and revoked tokens so callers cannot tell them apart.
///
/// # Non-exhaustive
///
/// New variants may be added in future minor releases. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// The token is not a live credential.
    #[error("Invalid token")]
    InvalidToken,

    /// The token is live but the presented client signals or requesting user
    /// do not match the session.
    #[error("Token not owned by sender")]
    NotOwnedBySender,

    /// The storage transaction failed.
    #[error("Storage failure: {0}")]
    Storage(#[source] StorageError),

    /// Signing a new token pair failed.
    #[error("Signing failure: {0}")]
    Signing(#[source] AuthError),

    /// The service's cancellation token fired before the operation started.
    #[error("Operation cancelled")]
    Cancelled,

    /// Issuer configuration or key material was rejected.
    #[error("Invalid configuration: {0}")]
    Config(#[source] AuthError),
}

impl From<StorageError> for TokenError {
    fn from(err: StorageError) -> Self {
        TokenError::Storage(err)
    }
}

impl From<AuthError> for TokenError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) => TokenError::InvalidToken,
            AuthError::Signing { .. } => TokenError::Signing(err),
            _ => TokenError::Config(err),
        }
    }
}

/// Result type alias for token service operations.
pub type Result<T> = std::result::Result<T, TokenError>;
