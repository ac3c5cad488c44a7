//! # credcore authentication
//!
//! Claims codec, token issuance and signature validation for credcore.
//!
//! This crate provides:
//! - **Claims codec**: core claims plus refresh-only extension fields, and
//!   base64(JSON) access-grant blobs
//! - **Issuer/validator**: signs access/refresh pairs sharing one identifier
//!   and verifies presented tokens
//! - **Algorithm validation**: only asymmetric algorithms are configurable
//!
//! ## Example
//!
//! ```no_run
//! use credcore_authn::{ExtensionFields, IssuerConfig, TokenIssuer, TokenKeys};
//! use jsonwebtoken::Algorithm;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = TokenKeys::from_pem_files(Algorithm::EdDSA, "signing.pem", "verify.pem")?;
//! let config = IssuerConfig::builder().algorithm(Algorithm::EdDSA).issuer("credcore").build()?;
//! let issuer = TokenIssuer::new(config, keys)?;
//!
//! let (access, refresh) = issuer.issue_tokens(ExtensionFields::new("user-1", "user", None))?;
//! assert!(issuer.validate_token(&access.token).valid);
//! # let _ = refresh;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - **`testutil`**: test key generation, raw JWT crafting and `assert_auth_error!`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Signed-token payload.
pub mod claims;
/// Issuer configuration.
pub mod config;
/// Authentication error types.
pub mod error;
/// Access-grant blobs.
pub mod grants;
/// Token issuance and validation.
pub mod issuer;
/// Signing and validation keys.
pub mod keys;
/// Test helpers.
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;
/// Algorithm validation.
pub mod validation;

pub use claims::{CoreClaims, ExtensionFields, TokenClaims, TokenKind, hash_user_id};
pub use config::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, IssuerConfig, MIN_TTL};
pub use error::{AuthError, ConfigError, Result};
pub use grants::{AccessGrant, decode_grants, encode_grants};
pub use issuer::{IssuedToken, TokenIssuer, ValidationResult};
pub use jsonwebtoken::Algorithm;
pub use keys::TokenKeys;
pub use validation::{ACCEPTED_ALGORITHMS, FORBIDDEN_ALGORITHMS, validate_algorithm};
