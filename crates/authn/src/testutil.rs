//! Shared test utilities for issuance and validation testing.
//!
//! This module provides helpers for generating Ed25519 key pairs, building
//! ready-to-use [`TokenKeys`] and [`TokenIssuer`] instances, and crafting raw
//! JWT strings for attack testing. It is feature-gated behind `testutil` to
//! prevent leaking into production builds.
//!
//! ```toml
//! [dev-dependencies]
//! credcore-authn = { path = "../authn", features = ["testutil"] }
//! ```

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ed25519_dalek::SigningKey;
use jsonwebtoken::Algorithm;
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::{IssuerConfig, TokenIssuer, TokenKeys};

/// Issuer claim used by [`test_issuer`].
pub const TEST_ISSUER: &str = "credcore-test";

/// Generates a test Ed25519 key pair.
///
/// Returns `(pkcs8_der, public_key_base64url)` where:
/// - `pkcs8_der` is the private key in PKCS#8 DER format wrapped in [`Zeroizing`]
/// - `public_key_base64url` is the 32-byte public key encoded as base64url without padding
///
/// Each call generates a fresh random key pair.
pub fn generate_test_keypair() -> (Zeroizing<Vec<u8>>, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key_b64 = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().to_bytes());

    let private_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(signing_key.to_bytes());
    let mut pkcs8_der = Zeroizing::new(vec![
        0x30, 0x2e, // SEQUENCE, 46 bytes
        0x02, 0x01, 0x00, // INTEGER version 0
        0x30, 0x05, // SEQUENCE, 5 bytes (algorithm identifier)
        0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
        0x04, 0x22, // OCTET STRING, 34 bytes
        0x04, 0x20, // OCTET STRING, 32 bytes (the actual key)
    ]);
    pkcs8_der.extend_from_slice(&*private_bytes);

    (pkcs8_der, public_key_b64)
}

/// Fresh EdDSA [`TokenKeys`].
///
/// # Panics
///
/// Panics if the generated key pair is rejected (should not happen).
pub fn test_keys() -> TokenKeys {
    let (der, public) = generate_test_keypair();
    TokenKeys::from_ed_der(&der, &public).expect("generated Ed25519 keys")
}

/// An EdDSA issuer named [`TEST_ISSUER`] with the given lifetimes.
///
/// # Panics
///
/// Panics if the lifetimes are rejected by [`IssuerConfig`].
pub fn test_issuer(access_ttl: Duration, refresh_ttl: Duration) -> TokenIssuer {
    let config = IssuerConfig::builder()
        .algorithm(Algorithm::EdDSA)
        .issuer(TEST_ISSUER)
        .access_ttl(access_ttl)
        .refresh_ttl(refresh_ttl)
        .build()
        .expect("test issuer config");
    TokenIssuer::new(config, test_keys()).expect("test issuer")
}

/// Creates a raw JWT string from arbitrary header and payload JSON.
///
/// The resulting JWT has the structure `{header_b64}.{payload_b64}.`
/// with an empty signature. This is useful for testing rejection of
/// malformed or attack JWTs (e.g., `alg: "none"`, algorithm confusion).
///
/// # Panics
///
/// Panics if JSON serialization fails.
pub fn craft_raw_jwt(header_json: &serde_json::Value, payload_json: &serde_json::Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header_json).expect("header json"));
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload_json).expect("payload json"));
    format!("{header_b64}.{payload_b64}.")
}

/// Asserts that a [`Result<T, AuthError>`](crate::AuthError) is an `Err`
/// matching the given variant.
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use credcore_authn::{AuthError, assert_auth_error};
///
/// let result: Result<(), AuthError> = Err(AuthError::invalid_token("expired"));
/// assert_auth_error!(result, InvalidToken);
/// ```
#[macro_export]
macro_rules! assert_auth_error {
    ($result:expr, $variant:ident) => {
        match $result {
            Err($crate::error::AuthError::$variant { .. }) => {},
            Err(other) => panic!("expected AuthError::{}, got: {:?}", stringify!($variant), other),
            Ok(_) => panic!("expected AuthError::{}, got Ok", stringify!($variant)),
        }
    };
    ($result:expr, $variant:ident, $msg:expr) => {
        match $result {
            Err($crate::error::AuthError::$variant { .. }) => {},
            Err(other) => {
                panic!("{}: expected AuthError::{}, got: {:?}", $msg, stringify!($variant), other)
            },
            Ok(_) => panic!("{}: expected AuthError::{}, got Ok", $msg, stringify!($variant)),
        }
    };
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{AuthError, ExtensionFields};

    #[test]
    fn test_generate_test_keypair_produces_valid_key() {
        let (pkcs8_der, public_key_b64) = generate_test_keypair();
        // 16 header bytes + 32 key bytes
        assert_eq!(pkcs8_der.len(), 48);
        assert_eq!(public_key_b64.len(), 43);
    }

    #[test]
    fn test_generate_test_keypair_unique() {
        let (_, pk1) = generate_test_keypair();
        let (_, pk2) = generate_test_keypair();
        assert_ne!(pk1, pk2, "each call should produce a unique key pair");
    }

    #[test]
    fn test_test_issuer_signs_verifiable_tokens() {
        let issuer = test_issuer(Duration::from_secs(60), Duration::from_secs(120));
        let (access, _) = issuer.issue_tokens(ExtensionFields::new("u", "user", None)).expect("issue");
        let claims = issuer.verify(&access.token).expect("verify");
        assert_eq!(claims.core.iss, TEST_ISSUER);
    }

    #[test]
    fn test_craft_raw_jwt_format() {
        let jwt = craft_raw_jwt(&json!({"alg": "none", "typ": "JWT"}), &json!({"sub": "test"}));
        let parts: Vec<&str> = jwt.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[2].is_empty(), "signature should be empty for raw JWTs");
    }

    #[test]
    fn test_assert_auth_error_macro() {
        let result: Result<(), AuthError> = Err(AuthError::invalid_token("expired"));
        assert_auth_error!(result, InvalidToken);
    }

    #[test]
    fn test_assert_auth_error_with_message() {
        let result: Result<(), AuthError> = Err(AuthError::signing("refresh"));
        assert_auth_error!(result, Signing, "signing should fail");
    }
}
