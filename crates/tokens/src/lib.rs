//! # credcore token service
//!
//! Mints short-lived access tokens and longer-lived refresh tokens bound to a
//! client identity, persists refresh-session metadata in an indexed store,
//! and supports lookup, rotation and revocation.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      TokenService                         │
//! │  create · check · extend · list · delete · delete-all     │
//! ├──────────────────────────────┬────────────────────────────┤
//! │   credcore_authn             │   credcore_storage         │
//! │   TokenIssuer (sign/verify)  │   SessionStore + indexes   │
//! └──────────────────────────────┴────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use credcore_authn::{Algorithm, TokenKeys};
//! use credcore_tokens::{CreateTokenRequest, ServiceConfig, TokenService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config: ServiceConfig = serde_json::from_str(r#"{
//!     "issuer": { "algorithm": "EdDSA", "issuer": "credcore" },
//!     "storage": { "type": "file", "path": "sessions.json" }
//! }"#)?;
//! let keys = TokenKeys::from_pem_files(Algorithm::EdDSA, "signing.pem", "verify.pem")?;
//! let service = TokenService::open(config, keys).await?;
//!
//! let pair = service
//!     .create_token(
//!         CreateTokenRequest::builder()
//!             .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
//!             .fingerprint("fp-1")
//!             .user_id("user-1")
//!             .ip("203.0.113.7")
//!             .role("user")
//!             .build(),
//!     )
//!     .await?;
//!
//! let checked = service
//!     .check_token(&pair.access.token, "Mozilla/5.0 (X11; Linux x86_64)", "203.0.113.7", "fp-1")
//!     .await?;
//! assert_eq!(checked.user_id, "user-1");
//!
//! service.close().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod identity;
pub mod service;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod testutil;

pub use config::ServiceConfig;
pub use error::{Result, TokenError};
pub use service::{CheckedToken, CreateTokenRequest, SessionInfo, TokenPair, TokenService};
