//! Storage error types and result alias.
//!
//! Both backends and the session layer report failures as [`StorageError`].
//! A missing session is not an error here: lookups return `Ok(None)` and the
//! caller decides what absence means. Nothing in this crate retries.
//!
//! ```
//! use credcore_storage::{MemoryBackend, StorageBackend, StorageError};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//! backend.close().await.unwrap();
//!
//! let err = backend.get(b"session/7f9c").await.unwrap_err();
//! assert!(matches!(err, StorageError::Closed));
//! # });
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by storage backends and the session layer.
///
/// I/O and codec failures keep their cause reachable through
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Data could not be encoded for storage or decoded when read back.
    ///
    /// Usually means a corrupted snapshot file or a schema change between
    /// writer and reader.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxError>,
    },

    /// Backend-specific failure, including snapshot file I/O.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxError>,
    },

    /// A key or value exceeded the configured [`SizeLimits`](crate::SizeLimits).
    #[error("{kind} size {actual} exceeds limit of {limit} bytes")]
    SizeLimitExceeded {
        /// Which part was too large (`"key"` or `"value"`).
        kind: &'static str,
        /// Observed size in bytes.
        actual: usize,
        /// Configured maximum in bytes.
        limit: usize,
    },

    /// The backend has been closed and accepts no further operations.
    #[error("Storage backend is closed")]
    Closed,
}

impl StorageError {
    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Serialization` error with a message and source error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `SizeLimitExceeded` error.
    #[must_use]
    pub fn size_limit_exceeded(kind: &'static str, actual: usize, limit: usize) -> Self {
        Self::SizeLimitExceeded { kind, actual, limit }
    }

    /// Creates a new `Closed` error.
    #[must_use]
    pub fn closed() -> Self {
        Self::Closed
    }
}

/// Rejected storage configuration, such as zero [`SizeLimits`](crate::SizeLimits).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A numeric field is below its minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Field name.
        field: &'static str,
        /// Minimum accepted value.
        min: String,
        /// Provided value.
        value: String,
    },
}
