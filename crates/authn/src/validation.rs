//! JWT algorithm validation.
//!
//! This module provides security checks for JWT algorithms, ensuring only
//! approved asymmetric algorithms are configured.
//!
//! # Security
//!
//! - Symmetric algorithms and `none` are always rejected
//! - Only the asymmetric algorithms in [`ACCEPTED_ALGORITHMS`] are allowed
//! - Verification pins the configured algorithm, so a token cannot pick its own

use jsonwebtoken::Algorithm;

use crate::error::AuthError;

/// Forbidden JWT algorithms that are never accepted for security reasons.
///
/// - `none`: No signature verification (trivially bypassable)
/// - `HS256`, `HS384`, `HS512`: Symmetric algorithms (shared secret vulnerability)
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none", "HS256", "HS384", "HS512"];

/// Accepted JWT algorithms.
pub const ACCEPTED_ALGORITHMS: &[&str] =
    &["EdDSA", "ES256", "ES384", "RS256", "RS384", "RS512", "PS256", "PS384", "PS512"];

/// Key material family an algorithm signs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    /// Ed25519.
    Edwards,
    /// NIST P-256 / P-384.
    EllipticCurve,
    /// RSA, PKCS#1 v1.5 or PSS padding.
    Rsa,
}

/// Validate a JWT algorithm name against the signing policy.
///
/// Forbidden names are checked first so they always produce the security
/// message, even if the name is otherwise unknown.
///
/// # Errors
///
/// Returns [`AuthError::UnsupportedAlgorithm`] if:
/// - Algorithm is symmetric (HS256, HS384, HS512)
/// - Algorithm is "none"
/// - Algorithm is not in [`ACCEPTED_ALGORITHMS`]
///
/// # Examples
///
/// ```
/// use credcore_authn::validation::validate_algorithm;
/// use jsonwebtoken::Algorithm;
///
/// assert_eq!(validate_algorithm("EdDSA").unwrap(), Algorithm::EdDSA);
/// assert!(validate_algorithm("HS256").is_err());
/// assert!(validate_algorithm("none").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<Algorithm, AuthError> {
    if FORBIDDEN_ALGORITHMS.contains(&alg) {
        return Err(AuthError::unsupported_algorithm(format!(
            "Algorithm '{alg}' is not allowed for security reasons"
        )));
    }

    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(AuthError::unsupported_algorithm(format!(
            "Algorithm '{alg}' is not in accepted list"
        )));
    }

    alg.parse::<Algorithm>()
        .map_err(|_| AuthError::unsupported_algorithm(format!("Algorithm '{alg}' is unknown")))
}

/// Checks an already-parsed [`Algorithm`] against the policy.
///
/// # Errors
///
/// Same as [`validate_algorithm`].
pub fn ensure_accepted(alg: Algorithm) -> Result<(), AuthError> {
    validate_algorithm(algorithm_name(alg)).map(|_| ())
}

/// Returns the JOSE name of `alg`.
#[must_use]
pub fn algorithm_name(alg: Algorithm) -> &'static str {
    match alg {
        Algorithm::HS256 => "HS256",
        Algorithm::HS384 => "HS384",
        Algorithm::HS512 => "HS512",
        Algorithm::ES256 => "ES256",
        Algorithm::ES384 => "ES384",
        Algorithm::RS256 => "RS256",
        Algorithm::RS384 => "RS384",
        Algorithm::RS512 => "RS512",
        Algorithm::PS256 => "PS256",
        Algorithm::PS384 => "PS384",
        Algorithm::PS512 => "PS512",
        Algorithm::EdDSA => "EdDSA",
    }
}

/// Returns the key family `alg` signs with, or `None` for symmetric algorithms.
#[must_use]
pub fn key_family(alg: Algorithm) -> Option<KeyFamily> {
    match alg {
        Algorithm::EdDSA => Some(KeyFamily::Edwards),
        Algorithm::ES256 | Algorithm::ES384 => Some(KeyFamily::EllipticCurve),
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => Some(KeyFamily::Rsa),
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_algorithm_accepts_every_listed_algorithm() {
        for alg in ACCEPTED_ALGORITHMS {
            let parsed = validate_algorithm(alg).expect("accepted");
            assert_eq!(algorithm_name(parsed), *alg);
            assert!(key_family(parsed).is_some());
        }
    }

    #[test]
    fn test_validate_algorithm_symmetric_rejected() {
        for alg in ["HS256", "HS384", "HS512"] {
            assert!(validate_algorithm(alg).is_err());
        }
    }

    #[test]
    fn test_validate_algorithm_none_rejected() {
        let result = validate_algorithm("none");
        assert!(
            matches!(result, Err(AuthError::UnsupportedAlgorithm(ref msg)) if msg.contains("not allowed for security reasons"))
        );
    }

    #[test]
    fn test_validate_algorithm_not_in_list() {
        let result = validate_algorithm("ES512");
        assert!(
            matches!(result, Err(AuthError::UnsupportedAlgorithm(ref msg)) if msg.contains("not in accepted list"))
        );
    }

    #[test]
    fn test_forbidden_algorithms_each_rejected_with_security_message() {
        for alg in FORBIDDEN_ALGORITHMS {
            let result = validate_algorithm(alg);
            assert!(
                matches!(result, Err(AuthError::UnsupportedAlgorithm(ref msg)) if msg.contains("not allowed for security reasons")),
                "Expected security rejection for forbidden algorithm '{alg}'"
            );
        }
    }

    #[test]
    fn test_ensure_accepted_on_parsed_algorithms() {
        assert!(ensure_accepted(Algorithm::EdDSA).is_ok());
        assert!(ensure_accepted(Algorithm::PS512).is_ok());
        assert!(ensure_accepted(Algorithm::HS256).is_err());
    }

    #[test]
    fn test_key_family_groups() {
        assert_eq!(key_family(Algorithm::EdDSA), Some(KeyFamily::Edwards));
        assert_eq!(key_family(Algorithm::ES384), Some(KeyFamily::EllipticCurve));
        assert_eq!(key_family(Algorithm::PS256), Some(KeyFamily::Rsa));
        assert_eq!(key_family(Algorithm::HS512), None);
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(validate_algorithm("eddsa").is_err());
        assert!(validate_algorithm("hs256").is_err());
    }
}
