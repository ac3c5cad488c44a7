//! Storage backend trait definition.
//!
//! [`StorageBackend`] is the byte-level key-value interface every backend
//! implements. Domain logic (session records, secondary indexes) lives in the
//! [`session`](crate::session) layer built on top of it, not in the backends.
//!
//! # Implementing a Backend
//!
//! 1. Implement the [`StorageBackend`] trait
//! 2. Implement a corresponding [`Transaction`] type
//! 3. Map backend-specific errors to [`StorageError`](crate::StorageError)
//!
//! See [`MemoryBackend`](crate::MemoryBackend) for the reference implementation.

use std::{ops::RangeBounds, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    error::StorageResult,
    transaction::Transaction,
    types::{KeyValue, prefix_range},
};

/// Abstract storage backend for key-value operations.
///
/// Backends are thread-safe and cheap to clone; all clones share one store.
/// Expired entries are never returned, whether or not the background sweeper
/// has removed them yet.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](StorageBackend::get) | Retrieve a single value by key |
/// | [`set`](StorageBackend::set) | Store a key-value pair |
/// | [`set_with_ttl`](StorageBackend::set_with_ttl) | Store with automatic expiration |
/// | [`delete`](StorageBackend::delete) | Remove a key |
/// | [`get_range`](StorageBackend::get_range) | Retrieve keys in a range |
/// | [`get_prefix`](StorageBackend::get_prefix) | Retrieve keys sharing a prefix |
/// | [`transaction`](StorageBackend::transaction) | Begin an atomic transaction |
/// | [`health_check`](StorageBackend::health_check) | Verify backend availability |
/// | [`close`](StorageBackend::close) | Flush and refuse further operations |
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use credcore_storage::{MemoryBackend, StorageBackend};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let backend = MemoryBackend::new();
///
/// backend.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();
/// let value = backend.get(b"key").await.unwrap();
/// assert_eq!(value, Some(Bytes::from("value")));
/// # });
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist or has expired.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores a key-value pair, clearing any TTL previously set on the key.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Stores a key-value pair that expires after `ttl`.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn set_with_ttl(&self, key: Vec<u8>, value: Vec<u8>, ttl: Duration) -> StorageResult<()>;

    /// Deletes a key. Deleting an absent key is a no-op.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Retrieves all live key-value pairs within a range, in key order.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send;

    /// Retrieves all live key-value pairs whose key starts with `prefix`.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn get_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<KeyValue>> {
        self.get_range(prefix_range(prefix)).await
    }

    /// Begins a new transaction.
    ///
    /// Waits until no other transaction holds the writer slot.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>>;

    /// Checks that the backend can serve traffic.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`](crate::StorageError::Closed) after
    /// [`close`](StorageBackend::close), or a backend-specific error when the
    /// durable location is unreachable.
    #[must_use = "health check results indicate backend availability and must be inspected"]
    async fn health_check(&self) -> StorageResult<()>;

    /// Flushes durable state and stops background work.
    ///
    /// Waits for an in-flight transaction to finish. Every later operation
    /// fails with [`StorageError::Closed`](crate::StorageError::Closed).
    /// Closing twice is a no-op.
    #[must_use = "storage operations may fail and errors must be handled"]
    async fn close(&self) -> StorageResult<()>;
}
