//! Token issuance and validation.
//!
//! # Example
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use credcore_authn::{ExtensionFields, IssuerConfig, TokenIssuer, TokenKind, testutil::test_keys};
//! use jsonwebtoken::Algorithm;
//!
//! let config = IssuerConfig::builder().algorithm(Algorithm::EdDSA).issuer("credcore").build()?;
//! let issuer = TokenIssuer::new(config, test_keys())?;
//!
//! let (access, refresh) = issuer.issue_tokens(ExtensionFields::new("alice", "user", None))?;
//! assert_eq!(access.id, refresh.id);
//!
//! let result = issuer.validate_token(&access.token);
//! assert!(result.valid);
//! assert_eq!(result.kind, Some(TokenKind::Access));
//! # Ok::<(), credcore_authn::AuthError>(())
//! ```

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    claims::{CoreClaims, ExtensionFields, TokenClaims, TokenKind},
    config::IssuerConfig,
    error::{AuthError, Result},
    keys::TokenKeys,
    validation::algorithm_name,
};

/// A freshly signed token. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The compact JWS string handed to the caller.
    pub token: String,
    /// Session identifier, shared with the sibling token.
    pub id: String,
    /// How long the token is valid for.
    pub lifetime: Duration,
}

/// Outcome of [`TokenIssuer::validate_token`].
///
/// `id` and `kind` are only populated, and only trustworthy, when `valid`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    /// Signature, issuer and expiry all checked out.
    pub valid: bool,
    /// Session identifier.
    pub id: Option<String>,
    /// Access or refresh.
    pub kind: Option<TokenKind>,
}

impl ValidationResult {
    fn invalid() -> Self {
        Self::default()
    }
}

/// Signs access/refresh pairs and verifies presented tokens.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: IssuerConfig,
    keys: TokenKeys,
    header: Header,
    validation: Validation,
}

impl TokenIssuer {
    /// Binds a configuration to its key material.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or if the keys were
    /// loaded for a different algorithm than the one configured.
    pub fn new(config: IssuerConfig, keys: TokenKeys) -> Result<Self> {
        config.validate()?;

        if keys.algorithm() != config.algorithm() {
            return Err(AuthError::invalid_key(format!(
                "keys are for {} but the issuer is configured for {}",
                algorithm_name(keys.algorithm()),
                algorithm_name(config.algorithm()),
            )));
        }

        let mut validation = Validation::new(config.algorithm());
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_issuer(&[config.issuer()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        let header = Header::new(config.algorithm());

        Ok(Self { config, keys, header, validation })
    }

    /// The configuration this issuer was built with.
    #[must_use]
    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Signs a new access/refresh pair under one fresh identifier.
    ///
    /// The refresh token carries `ext`; the access token carries no extension
    /// fields.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if either token cannot be signed.
    pub fn issue_tokens(&self, ext: ExtensionFields) -> Result<(IssuedToken, IssuedToken)> {
        let id = Uuid::new_v4().to_string();

        let refresh = self.sign(&id, TokenKind::Refresh, self.config.refresh_ttl(), Some(ext))?;
        let access = self.sign(&id, TokenKind::Access, self.config.access_ttl(), None)?;

        tracing::debug!(token_id = %id, "Issued token pair");
        Ok((access, refresh))
    }

    /// Verifies `token` and extracts its identifier and kind.
    ///
    /// Any parse, signature, issuer or expiry failure yields an invalid
    /// result; there is no partial outcome.
    #[must_use]
    pub fn validate_token(&self, token: &str) -> ValidationResult {
        match self.verify(token) {
            Ok(claims) => ValidationResult {
                valid: true,
                id: Some(claims.core.jti),
                kind: Some(claims.core.kind),
            },
            Err(_) => ValidationResult::invalid(),
        }
    }

    /// Verifies `token` and returns its full claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] on any verification failure.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let data = decode::<TokenClaims>(token, self.keys.decoding(), &self.validation)?;
        // `exp` has whole-second resolution and the library accepts
        // `exp == now`; a token is dead from its expiry second onwards.
        if Utc::now().timestamp() >= data.claims.core.exp {
            return Err(AuthError::invalid_token("token expired"));
        }
        Ok(data.claims)
    }

    fn sign(
        &self,
        id: &str,
        kind: TokenKind,
        lifetime: Duration,
        ext: Option<ExtensionFields>,
    ) -> Result<IssuedToken> {
        let iat = Utc::now().timestamp();
        let secs = i64::try_from(lifetime.as_secs())
            .map_err(|_| AuthError::signing(format!("lifetime {lifetime:?} out of range")))?;
        let exp = iat
            .checked_add(secs)
            .ok_or_else(|| AuthError::signing(format!("lifetime {lifetime:?} out of range")))?;

        let claims = TokenClaims {
            core: CoreClaims {
                jti: id.to_owned(),
                iss: self.config.issuer().to_owned(),
                iat,
                exp,
                kind,
            },
            ext,
        };

        let token = encode(&self.header, &claims, self.keys.encoding())
            .map_err(|e| AuthError::signing_with_source(format!("{kind:?} token"), e))?;

        Ok(IssuedToken { token, id: id.to_owned(), lifetime })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::testutil::{generate_test_keypair, test_keys};

    fn issuer_with(access: Duration, refresh: Duration) -> TokenIssuer {
        let config = IssuerConfig::builder()
            .algorithm(Algorithm::EdDSA)
            .issuer("credcore")
            .access_ttl(access)
            .refresh_ttl(refresh)
            .build()
            .expect("config");
        TokenIssuer::new(config, test_keys()).expect("issuer")
    }

    fn issuer() -> TokenIssuer {
        issuer_with(Duration::from_secs(2 * 3600), Duration::from_secs(48 * 3600))
    }

    #[test]
    fn test_pair_shares_identifier_and_lifetimes() {
        let issuer = issuer();
        let (access, refresh) =
            issuer.issue_tokens(ExtensionFields::new("alice", "user", None)).expect("issue");

        assert_eq!(access.id, refresh.id);
        assert_eq!(access.lifetime, Duration::from_secs(2 * 3600));
        assert_eq!(refresh.lifetime, Duration::from_secs(48 * 3600));
        assert!(Uuid::parse_str(&access.id).is_ok());
    }

    #[test]
    fn test_validate_reports_kind_and_id() {
        let issuer = issuer();
        let (access, refresh) =
            issuer.issue_tokens(ExtensionFields::new("alice", "user", None)).expect("issue");

        assert_eq!(
            issuer.validate_token(&access.token),
            ValidationResult { valid: true, id: Some(refresh.id.clone()), kind: Some(TokenKind::Access) }
        );
        assert_eq!(
            issuer.validate_token(&refresh.token),
            ValidationResult { valid: true, id: Some(refresh.id), kind: Some(TokenKind::Refresh) }
        );
    }

    #[test]
    fn test_extension_fields_only_in_refresh() {
        let issuer = issuer();
        let ext = ExtensionFields::new("alice", "admin", Some("parent-1".into()));
        let (access, refresh) = issuer.issue_tokens(ext.clone()).expect("issue");

        assert_eq!(issuer.verify(&access.token).expect("access").ext, None);
        assert_eq!(issuer.verify(&refresh.token).expect("refresh").ext, Some(ext));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let issuer = issuer();
        assert_eq!(issuer.validate_token("not-a-jwt"), ValidationResult::default());
        assert_eq!(issuer.validate_token(""), ValidationResult::default());
    }

    #[test]
    fn test_token_from_other_key_is_invalid() {
        let issuer = issuer();
        let (der, public) = generate_test_keypair();
        let other = TokenIssuer::new(
            issuer.config().clone(),
            TokenKeys::from_ed_der(&der, &public).expect("keys"),
        )
        .expect("issuer");

        let (access, _) = other.issue_tokens(ExtensionFields::new("a", "user", None)).expect("issue");
        assert!(!issuer.validate_token(&access.token).valid);
    }

    #[test]
    fn test_wrong_issuer_is_invalid() {
        let issuer = issuer();
        let config = IssuerConfig::builder()
            .algorithm(Algorithm::EdDSA)
            .issuer("someone-else")
            .build()
            .expect("config");
        // Same key material, different issuer claim.
        let foreign = TokenIssuer::new(config, issuer.keys.clone()).expect("issuer");

        let (access, _) = foreign.issue_tokens(ExtensionFields::new("a", "user", None)).expect("issue");
        assert!(!issuer.validate_token(&access.token).valid);
        assert!(matches!(issuer.verify(&access.token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_keys_for_other_algorithm_rejected() {
        let config = IssuerConfig::builder()
            .algorithm(Algorithm::ES256)
            .issuer("credcore")
            .build()
            .expect("config");
        assert!(matches!(TokenIssuer::new(config, test_keys()), Err(AuthError::InvalidKey(_))));
    }

    #[test]
    fn test_expired_token_is_invalid_without_leeway() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            core: CoreClaims {
                jti: "old".into(),
                iss: "credcore".into(),
                iat: now - 10,
                exp: now - 1,
                kind: TokenKind::Access,
            },
            ext: None,
        };
        let token = encode(&issuer.header, &claims, issuer.keys.encoding()).expect("encode");

        assert!(!issuer.validate_token(&token).valid);
    }

    fn signed_with_exp(issuer: &TokenIssuer, exp: i64) -> String {
        let claims = TokenClaims {
            core: CoreClaims {
                jti: "edge".into(),
                iss: "credcore".into(),
                iat: exp - 1,
                exp,
                kind: TokenKind::Access,
            },
            ext: None,
        };
        encode(&issuer.header, &claims, issuer.keys.encoding()).expect("encode")
    }

    #[test]
    fn test_token_is_dead_in_its_expiry_second() {
        let issuer = issuer();
        let now = Utc::now().timestamp();

        assert!(matches!(issuer.verify(&signed_with_exp(&issuer, now)), Err(AuthError::InvalidToken(_))));
        assert!(issuer.verify(&signed_with_exp(&issuer, now + 30)).is_ok());
    }

    #[test]
    fn test_one_second_lifetime_never_outlives_itself() {
        let issuer = issuer_with(Duration::from_secs(1), Duration::from_secs(1));
        let issued_at = std::time::Instant::now();
        let (access, _) = issuer.issue_tokens(ExtensionFields::new("a", "user", None)).expect("issue");

        std::thread::sleep(Duration::from_millis(1050));

        assert!(issued_at.elapsed() > access.lifetime);
        assert!(!issuer.validate_token(&access.token).valid);
    }
}
