//! Bounds on stored key and value sizes.
//!
//! Session keys are built from fixed-width digests, but session values carry
//! client-supplied grant lists and signals, so every committed write is
//! checked against a [`SizeLimits`] before anything is applied.
//!
//! | Limit | Default |
//! |-------|---------|
//! | key | 1 KiB |
//! | value | 64 KiB |

use crate::{ConfigError, StorageError};

/// Default maximum key size in bytes.
pub const DEFAULT_MAX_KEY_SIZE: usize = 1024;

/// Default maximum value size in bytes.
pub const DEFAULT_MAX_VALUE_SIZE: usize = 64 * 1024;

/// Upper bounds for a single stored entry.
///
/// ```
/// use credcore_storage::SizeLimits;
///
/// let limits = SizeLimits::new(256, 4096).unwrap();
/// assert!(limits.check(b"session/abc", b"{}").is_ok());
/// assert!(limits.check(&[b'k'; 257], b"{}").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    max_key_size: usize,
    max_value_size: usize,
}

impl SizeLimits {
    /// Creates limits of `max_key_size` and `max_value_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if either limit is zero.
    pub fn new(max_key_size: usize, max_value_size: usize) -> Result<Self, ConfigError> {
        for (field, value) in [("max_key_size", max_key_size), ("max_value_size", max_value_size)] {
            if value == 0 {
                return Err(ConfigError::BelowMinimum { field, min: "1".into(), value: "0".into() });
            }
        }
        Ok(Self { max_key_size, max_value_size })
    }

    /// Maximum key size in bytes.
    #[must_use]
    pub fn max_key_size(&self) -> usize {
        self.max_key_size
    }

    /// Maximum value size in bytes.
    #[must_use]
    pub fn max_value_size(&self) -> usize {
        self.max_value_size
    }

    /// Checks a key/value pair about to be written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SizeLimitExceeded`] naming the part that is too
    /// large. The key is checked first.
    pub fn check(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.check_key(key)?;
        bounded("value", value.len(), self.max_value_size)
    }

    /// Checks a key on its own, for writes that carry no value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SizeLimitExceeded`] if the key is too large.
    pub fn check_key(&self, key: &[u8]) -> Result<(), StorageError> {
        bounded("key", key.len(), self.max_key_size)
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self { max_key_size: DEFAULT_MAX_KEY_SIZE, max_value_size: DEFAULT_MAX_VALUE_SIZE }
    }
}

fn bounded(kind: &'static str, actual: usize, limit: usize) -> Result<(), StorageError> {
    if actual > limit {
        return Err(StorageError::size_limit_exceeded(kind, actual, limit));
    }
    Ok(())
}
