//! Typed session store over a [`StorageBackend`].

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, instrument};

use super::{
    SessionIdentity, StoredToken,
    keys::{identity_key, identity_prefix, session_key, user_key, user_prefix},
};
use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    transaction::Transaction,
    types::KeyValue,
};

fn decode_record(bytes: &Bytes) -> StorageResult<StoredToken> {
    serde_json::from_slice(bytes)
        .map_err(|e| StorageError::serialization_with_source("failed to decode session record", e))
}

fn index_ids(entries: Vec<KeyValue>) -> Vec<(Vec<u8>, String)> {
    entries
        .into_iter()
        .map(|kv| (kv.key.to_vec(), String::from_utf8_lossy(&kv.value).into_owned()))
        .collect()
}

fn sort_by_creation(records: &mut [StoredToken]) {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// Session records plus their identity and user indexes.
///
/// Reads on the store itself run against committed data. Every mutation goes
/// through a [`SessionTxn`] obtained from [`begin`](Self::begin), which holds
/// the backend's writer slot until it is committed or dropped.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use credcore_storage::{MemoryBackend, session::{SessionStore, StoredToken}};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = SessionStore::new(MemoryBackend::new());
/// let record = StoredToken::builder()
///     .id("s1").user_id("u1").user_agent("ua").platform("p")
///     .fingerprint("fp").ip("10.0.0.1").role("user")
///     .build();
///
/// let mut txn = store.begin().await.unwrap();
/// txn.evict_identity(&record.identity()).await.unwrap();
/// txn.insert(&record, Duration::from_secs(3600)).unwrap();
/// txn.commit().await.unwrap();
///
/// assert_eq!(store.list_user("u1").await.unwrap().len(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct SessionStore<B> {
    backend: B,
}

impl<B: StorageBackend> SessionStore<B> {
    /// Wraps `backend`.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Starts a write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if the backend was closed.
    pub async fn begin(&self) -> StorageResult<SessionTxn> {
        Ok(SessionTxn { txn: self.backend.transaction().await? })
    }

    /// Loads the live session `id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend or decode failure.
    pub async fn get(&self, id: &str) -> StorageResult<Option<StoredToken>> {
        self.backend.get(&session_key(id)).await?.as_ref().map(decode_record).transpose()
    }

    /// Lists the live sessions of `user_id`, oldest first.
    ///
    /// Index entries whose primary record has already gone are skipped.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend or decode failure.
    #[instrument(skip(self))]
    pub async fn list_user(&self, user_id: &str) -> StorageResult<Vec<StoredToken>> {
        let mut records = Vec::new();
        for (_, id) in index_ids(self.backend.get_prefix(&user_prefix(user_id)).await?) {
            if let Some(record) = self.get(&id).await? {
                records.push(record);
            }
        }
        sort_by_creation(&mut records);
        Ok(records)
    }

    /// Checks the backend is reachable and open.
    ///
    /// # Errors
    ///
    /// Propagates [`StorageBackend::health_check`].
    pub async fn health_check(&self) -> StorageResult<()> {
        self.backend.health_check().await
    }

    /// Flushes and closes the backend.
    ///
    /// # Errors
    ///
    /// Propagates [`StorageBackend::close`].
    pub async fn close(&self) -> StorageResult<()> {
        self.backend.close().await
    }
}

/// A write transaction over session records and both indexes.
///
/// Index-scoped deletes first collect every matching identifier with one
/// prefix scan and only then delete, so the scanned range is never mutated
/// mid-iteration.
pub struct SessionTxn {
    txn: Box<dyn Transaction>,
}

impl std::fmt::Debug for SessionTxn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTxn").finish_non_exhaustive()
    }
}

impl SessionTxn {
    /// Loads session `id`, seeing this transaction's own writes.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend or decode failure.
    pub async fn get(&self, id: &str) -> StorageResult<Option<StoredToken>> {
        self.txn.get(&session_key(id)).await?.as_ref().map(decode_record).transpose()
    }

    /// Buffers `record` and both index entries, all expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the record cannot be encoded.
    pub fn insert(&mut self, record: &StoredToken, ttl: Duration) -> StorageResult<()> {
        let value = serde_json::to_vec(record)
            .map_err(|e| StorageError::serialization_with_source("failed to encode session record", e))?;
        let id = record.id.as_bytes().to_vec();

        self.txn.set_with_ttl(session_key(&record.id), value, ttl);
        self.txn.set_with_ttl(identity_key(&record.identity(), &record.id), id.clone(), ttl);
        self.txn.set_with_ttl(user_key(&record.user_id, &record.id), id, ttl);
        Ok(())
    }

    /// Buffers removal of `record` and both of its index entries.
    pub fn remove(&mut self, record: &StoredToken) {
        self.txn.delete(session_key(&record.id));
        self.txn.delete(identity_key(&record.identity(), &record.id));
        self.txn.delete(user_key(&record.user_id, &record.id));
    }

    /// Removes session `id` if it exists and returns the removed record.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend or decode failure.
    pub async fn delete(&mut self, id: &str) -> StorageResult<Option<StoredToken>> {
        let record = self.get(id).await?;
        if let Some(record) = &record {
            self.remove(record);
        }
        Ok(record)
    }

    /// Removes every session found under an index prefix and returns the
    /// removed records. Stale index entries are dropped as well.
    async fn delete_indexed(&mut self, prefix: &[u8]) -> StorageResult<Vec<StoredToken>> {
        let collected = index_ids(self.txn.get_prefix(prefix).await?);

        let mut removed = Vec::with_capacity(collected.len());
        for (index_key, id) in collected {
            match self.get(&id).await? {
                Some(record) => {
                    self.remove(&record);
                    removed.push(record);
                },
                None => self.txn.delete(index_key),
            }
        }
        Ok(removed)
    }

    /// Removes every session occupying `identity`.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend or decode failure.
    #[instrument(skip(self, identity), fields(platform = %identity.platform))]
    pub async fn evict_identity(&mut self, identity: &SessionIdentity) -> StorageResult<Vec<StoredToken>> {
        let evicted = self.delete_indexed(&identity_prefix(identity)).await?;
        if !evicted.is_empty() {
            debug!(evicted = evicted.len(), "evicted sessions for identity");
        }
        Ok(evicted)
    }

    /// Lists the sessions of `user_id`, oldest first, including this
    /// transaction's own writes.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend or decode failure.
    pub async fn list_user(&self, user_id: &str) -> StorageResult<Vec<StoredToken>> {
        let mut records = Vec::new();
        for (_, id) in index_ids(self.txn.get_prefix(&user_prefix(user_id)).await?) {
            if let Some(record) = self.get(&id).await? {
                records.push(record);
            }
        }
        sort_by_creation(&mut records);
        Ok(records)
    }

    /// Removes every session owned by `user_id` and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error on backend or decode failure.
    #[instrument(skip(self))]
    pub async fn delete_user(&mut self, user_id: &str) -> StorageResult<usize> {
        let removed = self.delete_indexed(&user_prefix(user_id)).await?;
        Ok(removed.len())
    }

    /// Commits every buffered change atomically.
    ///
    /// # Errors
    ///
    /// Propagates [`Transaction::commit`].
    pub async fn commit(self) -> StorageResult<()> {
        self.txn.commit().await
    }
}
