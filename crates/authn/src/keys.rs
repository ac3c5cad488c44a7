//! Signing and validation key material.

use std::{fmt, path::Path};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use zeroize::Zeroizing;

use crate::{
    error::{AuthError, Result},
    validation::{KeyFamily, algorithm_name, ensure_accepted, key_family},
};

const ED25519_PUBLIC_KEY_LEN: usize = 32;

/// A signing key and its matching validation key, bound to one algorithm.
///
/// Constructed once at startup and handed to the issuer. Never serialised.
#[derive(Clone)]
pub struct TokenKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    /// Loads a PEM key pair for `algorithm`.
    ///
    /// The PEM flavour is chosen from the algorithm's family: Ed25519 for
    /// `EdDSA`, EC for `ES*`, RSA for `RS*` and `PS*`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsupportedAlgorithm`] for algorithms outside the
    /// policy and [`AuthError::InvalidKey`] if either PEM does not parse.
    pub fn from_pem(algorithm: Algorithm, private_pem: &[u8], public_pem: &[u8]) -> Result<Self> {
        ensure_accepted(algorithm)?;

        let (encoding, decoding) = match key_family(algorithm) {
            Some(KeyFamily::Edwards) => {
                (EncodingKey::from_ed_pem(private_pem), DecodingKey::from_ed_pem(public_pem))
            },
            Some(KeyFamily::EllipticCurve) => {
                (EncodingKey::from_ec_pem(private_pem), DecodingKey::from_ec_pem(public_pem))
            },
            Some(KeyFamily::Rsa) => {
                (EncodingKey::from_rsa_pem(private_pem), DecodingKey::from_rsa_pem(public_pem))
            },
            None => {
                return Err(AuthError::unsupported_algorithm(algorithm_name(algorithm)));
            },
        };

        let encoding = encoding
            .map_err(|e| AuthError::invalid_key(format!("private key for {algorithm:?}: {e}")))?;
        let decoding = decoding
            .map_err(|e| AuthError::invalid_key(format!("public key for {algorithm:?}: {e}")))?;

        Ok(Self { algorithm, encoding, decoding })
    }

    /// Loads an EdDSA key pair from a PKCS#8 DER private key and a base64url
    /// (unpadded) 32-byte public key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKey`] if the public key is not 32 bytes of
    /// base64url or the private key is empty.
    pub fn from_ed_der(pkcs8_der: &[u8], public_key_b64url: &str) -> Result<Self> {
        if pkcs8_der.is_empty() {
            return Err(AuthError::invalid_key("empty Ed25519 private key"));
        }

        let raw = URL_SAFE_NO_PAD
            .decode(public_key_b64url)
            .map_err(|e| AuthError::invalid_key(format!("public key is not base64url: {e}")))?;
        if raw.len() != ED25519_PUBLIC_KEY_LEN {
            return Err(AuthError::invalid_key(format!(
                "Ed25519 public key must be {ED25519_PUBLIC_KEY_LEN} bytes, got {}",
                raw.len()
            )));
        }

        let decoding = DecodingKey::from_ed_components(public_key_b64url)
            .map_err(|e| AuthError::invalid_key(format!("public key: {e}")))?;

        Ok(Self {
            algorithm: Algorithm::EdDSA,
            encoding: EncodingKey::from_ed_der(pkcs8_der),
            decoding,
        })
    }

    /// Reads a PEM key pair from disk. See [`TokenKeys::from_pem`].
    ///
    /// The private key bytes are scrubbed from memory once parsed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidKey`] if either file cannot be read, plus
    /// everything [`TokenKeys::from_pem`] returns.
    pub fn from_pem_files(
        algorithm: Algorithm,
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let private_path = private_path.as_ref();
        let public_path = public_path.as_ref();

        let private_pem = Zeroizing::new(std::fs::read(private_path).map_err(|e| {
            AuthError::invalid_key(format!("reading {}: {e}", private_path.display()))
        })?);
        let public_pem = std::fs::read(public_path).map_err(|e| {
            AuthError::invalid_key(format!("reading {}: {e}", public_path.display()))
        })?;

        Self::from_pem(algorithm, &private_pem, &public_pem)
    }

    /// The algorithm these keys sign with.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
