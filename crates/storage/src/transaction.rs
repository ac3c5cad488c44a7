//! Transaction trait for atomic storage operations.
//!
//! # Transaction Semantics
//!
//! Transactions provide:
//! - **Atomicity**: all buffered writes are applied together at commit, or none are
//! - **Read-your-writes**: reads and prefix scans within a transaction see pending writes
//! - **Writer serialisation**: a transaction holds the backend's single writer slot from
//!   [`StorageBackend::transaction`](crate::StorageBackend::transaction) until it is committed
//!   or dropped
//!
//! Dropping a transaction without committing discards its buffered writes.
//!
//! # Example
//!
//! ```
//! use credcore_storage::{MemoryBackend, StorageBackend};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new();
//!
//! let mut txn = backend.transaction().await.unwrap();
//! txn.set(b"session/a".to_vec(), b"1".to_vec());
//! txn.set(b"session/b".to_vec(), b"2".to_vec());
//! assert_eq!(txn.get_prefix(b"session/").await.unwrap().len(), 2);
//! txn.commit().await.unwrap();
//!
//! assert!(backend.get(b"session/a").await.unwrap().is_some());
//! # });
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::StorageResult, types::KeyValue};

/// Transaction handle for atomic multi-operation commits.
///
/// Writes are buffered until [`commit`](Transaction::commit). Size limits are
/// checked at commit time, so a violation rejects the whole transaction.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Gets a value within the transaction.
    ///
    /// Pending writes take precedence over committed data; a pending delete
    /// reads as `None`.
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Returns every live entry whose key starts with `prefix`, in key order,
    /// with pending writes merged in.
    async fn get_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<KeyValue>>;

    /// Buffers a set operation. Any TTL previously attached to the key is
    /// cleared when the transaction commits.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Buffers a set operation whose entry expires `ttl` after commit.
    fn set_with_ttl(&mut self, key: Vec<u8>, value: Vec<u8>, ttl: Duration);

    /// Buffers a delete operation. Deleting an absent key is a no-op.
    fn delete(&mut self, key: Vec<u8>);

    /// Commits all buffered operations atomically and releases the writer slot.
    ///
    /// # Errors
    ///
    /// - [`StorageError::SizeLimitExceeded`](crate::StorageError::SizeLimitExceeded) if a buffered
    ///   key or value is too large
    /// - [`StorageError::Closed`](crate::StorageError::Closed) if the backend was closed
    /// - [`StorageError::Internal`](crate::StorageError::Internal) if the durable snapshot could not
    ///   be written; no buffered write is applied in that case
    async fn commit(self: Box<Self>) -> StorageResult<()>;
}
