//! Shared test utilities for token service testing.
//!
//! Feature-gated behind `testutil`.
//!
//! ```toml
//! [dev-dependencies]
//! credcore-tokens = { path = "../tokens", features = ["testutil"] }
//! ```

use std::time::Duration;

use credcore_authn::testutil::test_issuer;
use credcore_storage::MemoryBackend;

use crate::{CreateTokenRequest, TokenService};

/// User agent used by [`create_request`]; its platform is `X11`.
pub const TEST_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Client IP used by [`create_request`].
pub const TEST_IP: &str = "192.0.2.10";

/// An in-memory service with the given lifetimes and fresh EdDSA keys.
pub fn memory_service(access_ttl: Duration, refresh_ttl: Duration) -> TokenService<MemoryBackend> {
    TokenService::new(test_issuer(access_ttl, refresh_ttl), MemoryBackend::new())
}

/// A create request for `user_id` from [`TEST_USER_AGENT`] at [`TEST_IP`]
/// with the given fingerprint and role `user`.
pub fn create_request(user_id: &str, fingerprint: &str) -> CreateTokenRequest {
    CreateTokenRequest::builder()
        .user_agent(TEST_USER_AGENT)
        .fingerprint(fingerprint)
        .user_id(user_id)
        .ip(TEST_IP)
        .role("user")
        .build()
}

/// Assert that a [`Result`](crate::Result) is a specific
/// [`TokenError`](crate::TokenError) variant.
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use credcore_tokens::{TokenError, assert_token_error};
///
/// let result: credcore_tokens::Result<()> = Err(TokenError::InvalidToken);
/// assert_token_error!(result, TokenError::InvalidToken);
/// ```
#[macro_export]
macro_rules! assert_token_error {
    ($result:expr, $pattern:pat $(,)?) => {
        match $result {
            Err($pattern) => {},
            Err(other) => panic!("expected {}, got: {:?}", stringify!($pattern), other),
            Ok(_) => panic!("expected {}, got Ok", stringify!($pattern)),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenError;

    #[tokio::test]
    async fn test_memory_service_round_trip() {
        let service = memory_service(Duration::from_secs(60), Duration::from_secs(120));
        let pair = service.create_token(create_request("u1", "fp")).await.expect("create");
        service.check_token(&pair.access.token, TEST_USER_AGENT, TEST_IP, "fp").await.expect("check");
    }

    #[test]
    fn test_assert_token_error_macro() {
        let result: crate::Result<()> = Err(TokenError::NotOwnedBySender);
        assert_token_error!(result, TokenError::NotOwnedBySender);
    }
}
