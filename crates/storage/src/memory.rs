//! In-memory storage backend implementation.
//!
//! [`MemoryBackend`] is the storage engine shared by every backend in this
//! crate. On its own it keeps data only in memory; [`FileBackend`](crate::FileBackend)
//! runs the same engine with a durable snapshot attached.
//!
//! # Features
//!
//! - **Thread-safe**: data is guarded by a [`parking_lot::RwLock`] that is never held across an
//!   `.await`
//! - **Ordered storage**: keys live in a [`BTreeMap`] for prefix and range scans
//! - **TTL support**: expired entries are hidden from reads immediately and removed by a background
//!   sweeper
//! - **Serialised writers**: one writer at a time, enforced by a [`tokio::sync::Mutex`] whose owned
//!   guard lives inside each [`Transaction`]
//!
//! # Example
//!
//! ```
//! use credcore_storage::{MemoryBackend, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MemoryBackend::new();
//!
//!     backend.set(b"greeting".to_vec(), b"hello".to_vec()).await.unwrap();
//!     let value = backend.get(b"greeting").await.unwrap();
//!
//!     assert_eq!(value.unwrap().as_ref(), b"hello");
//! }
//! ```
//!
//! # Performance Characteristics
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | get | O(log n) |
//! | get_range | O(log n + k) where k is result size |
//! | commit (memory only) | O(w log n) where w is the number of buffered writes |
//! | commit (with snapshot) | O(n) |

use std::{
    collections::BTreeMap,
    ops::{Bound, RangeBounds},
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use tokio::{
    select,
    sync::{Mutex, OwnedMutexGuard, watch},
    time::sleep,
};
use tracing::{debug, info, warn};

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    file::SnapshotFile,
    size_limits::SizeLimits,
    transaction::Transaction,
    types::{KeyValue, prefix_range},
};

/// How often the background sweeper removes expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// A stored value and its optional absolute expiry.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) value: Bytes,
    pub(crate) expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub(crate) fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// A buffered mutation awaiting commit.
#[derive(Debug, Clone)]
pub(crate) enum PendingWrite {
    Put { value: Vec<u8>, ttl: Option<Duration> },
    Delete,
}

struct State {
    entries: BTreeMap<Vec<u8>, Entry>,
    closed: bool,
}

struct Inner {
    state: RwLock<State>,
    writer: Arc<Mutex<()>>,
    snapshot: Option<SnapshotFile>,
    limits: SizeLimits,
    shutdown_tx: watch::Sender<bool>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The sweeper may already be gone.
        let _ = self.shutdown_tx.send(true);
    }
}

/// In-memory storage backend using [`BTreeMap`].
///
/// # Cloning
///
/// `MemoryBackend` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying data store and the same writer slot.
///
/// # Shutdown
///
/// The background sweeper holds only a weak reference and stops when the
/// last clone is dropped or [`close`](StorageBackend::close) is called.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    /// Creates a new in-memory backend with default [`SizeLimits`].
    ///
    /// When called inside a Tokio runtime this also spawns the TTL sweeper.
    /// Outside a runtime, expired entries are still hidden from reads but
    /// are only reclaimed when overwritten.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size_limits(SizeLimits::default())
    }

    /// Creates a new in-memory backend enforcing the given size limits.
    #[must_use]
    pub fn with_size_limits(limits: SizeLimits) -> Self {
        Self::from_parts(BTreeMap::new(), None, limits, DEFAULT_SWEEP_INTERVAL)
    }

    pub(crate) fn from_parts(
        entries: BTreeMap<Vec<u8>, Entry>,
        snapshot: Option<SnapshotFile>,
        limits: SizeLimits,
        sweep_interval: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let backend = Self {
            inner: Arc::new(Inner {
                state: RwLock::new(State { entries, closed: false }),
                writer: Arc::new(Mutex::new(())),
                snapshot,
                limits,
                shutdown_tx,
            }),
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let weak = Arc::downgrade(&backend.inner);
            handle.spawn(sweep_expired(weak, shutdown_rx, sweep_interval));
        }

        backend
    }

    /// Returns the size limits enforced on writes.
    #[must_use]
    pub fn size_limits(&self) -> SizeLimits {
        self.inner.limits
    }

    fn ensure_open(state: &State) -> StorageResult<()> {
        if state.closed { Err(StorageError::closed()) } else { Ok(()) }
    }

    /// Applies `writes` atomically. The caller must hold the writer slot.
    ///
    /// With a snapshot attached, the post-commit image is written to disk
    /// first; memory is only updated once the file has been replaced.
    async fn apply(&self, writes: BTreeMap<Vec<u8>, PendingWrite>) -> StorageResult<()> {
        Self::ensure_open(&self.inner.state.read())?;

        if writes.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut resolved: Vec<(Vec<u8>, Option<Entry>)> = Vec::with_capacity(writes.len());
        for (key, write) in writes {
            match write {
                PendingWrite::Put { value, ttl } => {
                    self.inner.limits.check(&key, &value)?;
                    let expires_at = ttl.map(|ttl| expiry_after(now, ttl)).transpose()?;
                    resolved.push((key, Some(Entry { value: Bytes::from(value), expires_at })));
                },
                PendingWrite::Delete => resolved.push((key, None)),
            }
        }

        if let Some(snapshot) = &self.inner.snapshot {
            let encoded = {
                let state = self.inner.state.read();
                let mut image: BTreeMap<&[u8], &Entry> = state
                    .entries
                    .iter()
                    .filter(|(_, entry)| entry.is_live(now))
                    .map(|(key, entry)| (key.as_slice(), entry))
                    .collect();
                for (key, entry) in &resolved {
                    match entry {
                        Some(entry) => image.insert(key.as_slice(), entry),
                        None => image.remove(key.as_slice()),
                    };
                }
                SnapshotFile::encode(image)?
            };

            if let Err(e) = snapshot.write(encoded).await {
                warn!(error = %e, path = %snapshot.path().display(), "snapshot write failed, commit discarded");
                return Err(e);
            }
        }

        let mut state = self.inner.state.write();
        for (key, entry) in resolved {
            match entry {
                Some(entry) => state.entries.insert(key, entry),
                None => state.entries.remove(&key),
            };
        }

        Ok(())
    }

    async fn write_one(&self, key: Vec<u8>, write: PendingWrite) -> StorageResult<()> {
        let _writer = self.inner.writer.lock().await;
        self.apply(BTreeMap::from([(key, write)])).await
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("persistent", &self.inner.snapshot.is_some())
            .field("limits", &self.inner.limits)
            .finish_non_exhaustive()
    }
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> StorageResult<DateTime<Utc>> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| StorageError::internal(format!("ttl of {ttl:?} is out of range")))
}

/// Background task removing expired entries.
///
/// Exits when the backend is dropped or closed.
async fn sweep_expired(
    inner: Weak<Inner>,
    mut shutdown_rx: watch::Receiver<bool>,
    interval: Duration,
) {
    loop {
        select! {
            _ = sleep(interval) => {}
            _ = shutdown_rx.changed() => {
                return;
            }
        }

        let Some(inner) = inner.upgrade() else {
            return;
        };

        let now = Utc::now();
        let removed = {
            let mut state = inner.state.write();
            let before = state.entries.len();
            state.entries.retain(|_, entry| entry.is_live(now));
            before - state.entries.len()
        };

        if removed > 0 {
            debug!(removed, "swept expired entries");
        }
    }
}

fn to_slice_bound(bound: Bound<&Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(b) => Bound::Included(b.as_slice()),
        Bound::Excluded(b) => Bound::Excluded(b.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        let state = self.inner.state.read();
        Self::ensure_open(&state)?;
        let now = Utc::now();
        Ok(state.entries.get(key).filter(|entry| entry.is_live(now)).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.write_one(key, PendingWrite::Put { value, ttl: None }).await
    }

    async fn set_with_ttl(&self, key: Vec<u8>, value: Vec<u8>, ttl: Duration) -> StorageResult<()> {
        self.write_one(key, PendingWrite::Put { value, ttl: Some(ttl) }).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.write_one(key.to_vec(), PendingWrite::Delete).await
    }

    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send,
    {
        let state = self.inner.state.read();
        Self::ensure_open(&state)?;
        let now = Utc::now();

        let bounds = (to_slice_bound(range.start_bound()), to_slice_bound(range.end_bound()));
        let results = state
            .entries
            .range::<[u8], _>(bounds)
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(k, entry)| KeyValue::new(Bytes::copy_from_slice(k), entry.value.clone()))
            .collect();

        Ok(results)
    }

    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        let guard = Arc::clone(&self.inner.writer).lock_owned().await;
        Self::ensure_open(&self.inner.state.read())?;
        Ok(Box::new(MemoryTransaction::new(self.clone(), guard)))
    }

    async fn health_check(&self) -> StorageResult<()> {
        Self::ensure_open(&self.inner.state.read())?;
        match &self.inner.snapshot {
            Some(snapshot) => snapshot.check().await,
            None => Ok(()),
        }
    }

    async fn close(&self) -> StorageResult<()> {
        let _writer = self.inner.writer.lock().await;
        if self.inner.state.read().closed {
            return Ok(());
        }

        let flushed = match &self.inner.snapshot {
            Some(snapshot) => {
                let now = Utc::now();
                let encoded = {
                    let state = self.inner.state.read();
                    SnapshotFile::encode(
                        state
                            .entries
                            .iter()
                            .filter(|(_, entry)| entry.is_live(now))
                            .map(|(key, entry)| (key.as_slice(), entry))
                            .collect(),
                    )
                };
                match encoded {
                    Ok(encoded) => snapshot.write(encoded).await,
                    Err(e) => Err(e),
                }
            },
            None => Ok(()),
        };

        self.inner.state.write().closed = true;
        let _ = self.inner.shutdown_tx.send(true);
        info!(persistent = self.inner.snapshot.is_some(), "storage backend closed");

        flushed
    }
}

/// In-memory transaction implementation.
///
/// Buffers writes until commit and holds the backend's writer slot for its
/// whole lifetime.
struct MemoryTransaction {
    backend: MemoryBackend,
    pending: BTreeMap<Vec<u8>, PendingWrite>,
    _writer: OwnedMutexGuard<()>,
}

impl MemoryTransaction {
    fn new(backend: MemoryBackend, writer: OwnedMutexGuard<()>) -> Self {
        Self { backend, pending: BTreeMap::new(), _writer: writer }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        match self.pending.get(key) {
            Some(PendingWrite::Put { value, .. }) => Ok(Some(Bytes::copy_from_slice(value))),
            Some(PendingWrite::Delete) => Ok(None),
            None => self.backend.get(key).await,
        }
    }

    async fn get_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<KeyValue>> {
        let mut merged: BTreeMap<Bytes, Bytes> = self
            .backend
            .get_prefix(prefix)
            .await?
            .into_iter()
            .map(|kv| (kv.key, kv.value))
            .collect();

        for (key, write) in self.pending.range(prefix_range(prefix)) {
            let key = Bytes::copy_from_slice(key);
            match write {
                PendingWrite::Put { value, .. } => {
                    merged.insert(key, Bytes::copy_from_slice(value));
                },
                PendingWrite::Delete => {
                    merged.remove(&key);
                },
            }
        }

        Ok(merged.into_iter().map(|(key, value)| KeyValue::new(key, value)).collect())
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.pending.insert(key, PendingWrite::Put { value, ttl: None });
    }

    fn set_with_ttl(&mut self, key: Vec<u8>, value: Vec<u8>, ttl: Duration) {
        self.pending.insert(key, PendingWrite::Put { value, ttl: Some(ttl) });
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.pending.insert(key, PendingWrite::Delete);
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryTransaction { backend, pending, _writer } = *self;
        backend.apply(pending).await
    }
}
