//! Issuer configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use credcore_authn::IssuerConfig;
//! use jsonwebtoken::Algorithm;
//!
//! let config = IssuerConfig::builder()
//!     .algorithm(Algorithm::EdDSA)
//!     .issuer("credcore")
//!     .access_ttl(Duration::from_secs(2 * 3600))
//!     .refresh_ttl(Duration::from_secs(48 * 3600))
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.issuer(), "credcore");
//! ```

use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    validation::ensure_accepted,
};

/// Default access-token lifetime (2 hours).
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(2 * 3600);

/// Default refresh-token lifetime (48 hours).
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(48 * 3600);

/// Shortest lifetime either token may have.
pub const MIN_TTL: Duration = Duration::from_secs(1);

fn default_access_ttl() -> Duration {
    DEFAULT_ACCESS_TTL
}

fn default_refresh_ttl() -> Duration {
    DEFAULT_REFRESH_TTL
}

/// How tokens are signed and how long they live.
///
/// Deserialised configuration is not validated until it reaches
/// [`TokenIssuer::new`](crate::TokenIssuer::new), which calls
/// [`IssuerConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuerConfig {
    algorithm: Algorithm,
    issuer: String,
    #[serde(with = "humantime_serde", default = "default_access_ttl")]
    access_ttl: Duration,
    #[serde(with = "humantime_serde", default = "default_refresh_ttl")]
    refresh_ttl: Duration,
}

#[bon::bon]
impl IssuerConfig {
    /// Creates a configuration, validating every field.
    ///
    /// # Optional Fields
    ///
    /// * `access_ttl` - Access-token lifetime (default: 2 hours).
    /// * `refresh_ttl` - Refresh-token lifetime (default: 48 hours).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The algorithm is symmetric, `none`, or otherwise outside the policy
    /// - The issuer is empty
    /// - Either lifetime is shorter than [`MIN_TTL`]
    /// - The access lifetime exceeds the refresh lifetime
    #[builder]
    pub fn new(
        algorithm: Algorithm,
        #[builder(into)] issuer: String,
        #[builder(default = DEFAULT_ACCESS_TTL)] access_ttl: Duration,
        #[builder(default = DEFAULT_REFRESH_TTL)] refresh_ttl: Duration,
    ) -> Result<Self> {
        let config = Self { algorithm, issuer, access_ttl, refresh_ttl };
        config.validate()?;
        Ok(config)
    }

    /// Checks every invariant [`IssuerConfig::new`] enforces.
    ///
    /// # Errors
    ///
    /// See [`IssuerConfig::new`].
    pub fn validate(&self) -> Result<()> {
        ensure_accepted(self.algorithm)?;

        if self.issuer.is_empty() {
            return Err(ConfigError::Empty { field: "issuer" }.into());
        }

        for (field, value) in [("access_ttl", self.access_ttl), ("refresh_ttl", self.refresh_ttl)] {
            if value < MIN_TTL {
                return Err(ConfigError::BelowMinimum {
                    field,
                    min: format!("{MIN_TTL:?}"),
                    value: format!("{value:?}"),
                }
                .into());
            }
        }

        if self.access_ttl > self.refresh_ttl {
            return Err(ConfigError::AccessOutlivesRefresh {
                access: format!("{:?}", self.access_ttl),
                refresh: format!("{:?}", self.refresh_ttl),
            }
            .into());
        }

        Ok(())
    }

    /// Signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Issuer claim written into and required of every token.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Access-token lifetime.
    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh-token lifetime, also the stored session's TTL.
    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    #[test]
    fn test_defaults() {
        let config = IssuerConfig::builder()
            .algorithm(Algorithm::EdDSA)
            .issuer("credcore")
            .build()
            .expect("valid");
        assert_eq!(config.access_ttl(), DEFAULT_ACCESS_TTL);
        assert_eq!(config.refresh_ttl(), DEFAULT_REFRESH_TTL);
    }

    #[test]
    fn test_symmetric_algorithm_rejected() {
        let result = IssuerConfig::builder().algorithm(Algorithm::HS256).issuer("credcore").build();
        assert!(matches!(result, Err(AuthError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_empty_issuer_rejected() {
        let result = IssuerConfig::builder().algorithm(Algorithm::EdDSA).issuer("").build();
        assert!(matches!(result, Err(AuthError::Config(ConfigError::Empty { field: "issuer" }))));
    }

    #[test]
    fn test_sub_second_ttl_rejected() {
        let result = IssuerConfig::builder()
            .algorithm(Algorithm::EdDSA)
            .issuer("credcore")
            .access_ttl(Duration::from_millis(500))
            .build();
        assert!(matches!(
            result,
            Err(AuthError::Config(ConfigError::BelowMinimum { field: "access_ttl", .. }))
        ));
    }

    #[test]
    fn test_access_longer_than_refresh_rejected() {
        let result = IssuerConfig::builder()
            .algorithm(Algorithm::EdDSA)
            .issuer("credcore")
            .access_ttl(Duration::from_secs(3600))
            .refresh_ttl(Duration::from_secs(60))
            .build();
        assert!(matches!(result, Err(AuthError::Config(ConfigError::AccessOutlivesRefresh { .. }))));
    }

    #[test]
    fn test_deserialize_humantime() {
        let config: IssuerConfig = serde_json::from_str(
            r#"{"algorithm": "ES256", "issuer": "credcore", "access_ttl": "2h", "refresh_ttl": "2days"}"#,
        )
        .expect("deserialize");
        assert_eq!(config.algorithm(), Algorithm::ES256);
        assert_eq!(config.refresh_ttl(), Duration::from_secs(48 * 3600));
        config.validate().expect("valid");
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let config: IssuerConfig =
            serde_json::from_str(r#"{"algorithm": "EdDSA", "issuer": "credcore"}"#).expect("deserialize");
        assert_eq!(config.access_ttl(), DEFAULT_ACCESS_TTL);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result = serde_json::from_str::<IssuerConfig>(
            r#"{"algorithm": "EdDSA", "issuer": "credcore", "secret": "x"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialized_forbidden_algorithm_fails_validation() {
        let config: IssuerConfig =
            serde_json::from_str(r#"{"algorithm": "HS256", "issuer": "credcore"}"#).expect("deserialize");
        assert!(matches!(config.validate(), Err(AuthError::UnsupportedAlgorithm(_))));
    }
}
