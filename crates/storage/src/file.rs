//! Durable file-backed storage.
//!
//! [`FileBackend`] runs the [`MemoryBackend`] engine with a snapshot file
//! attached. Every committed mutation rewrites the whole snapshot: the new
//! image goes to `<path>.tmp`, is synced, and is then renamed over `<path>`.
//! A reader of `<path>` therefore always sees either the old or the new
//! image, never a torn write.
//!
//! # Snapshot format
//!
//! ```json
//! { "version": 1,
//!   "entries": [ { "key": "<base64>", "value": "<base64>", "expires_at_ms": 1700000000000 } ] }
//! ```
//!
//! `expires_at_ms` is absolute UTC milliseconds and is omitted for entries
//! without a TTL. Entries already expired at load time are skipped.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    ops::RangeBounds,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    backend::StorageBackend,
    error::{StorageError, StorageResult},
    memory::{DEFAULT_SWEEP_INTERVAL, Entry, MemoryBackend},
    size_limits::SizeLimits,
    transaction::Transaction,
    types::KeyValue,
};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotDocument {
    version: u32,
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotEntry {
    key: String,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<i64>,
}

/// Location of a snapshot and the I/O performed on it.
#[derive(Debug, Clone)]
pub(crate) struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Serialises a full image of the store.
    pub(crate) fn encode(image: BTreeMap<&[u8], &Entry>) -> StorageResult<Vec<u8>> {
        let document = SnapshotDocument {
            version: SNAPSHOT_VERSION,
            entries: image
                .into_iter()
                .map(|(key, entry)| SnapshotEntry {
                    key: STANDARD.encode(key),
                    value: STANDARD.encode(&entry.value),
                    expires_at_ms: entry.expires_at.map(|at| at.timestamp_millis()),
                })
                .collect(),
        };

        serde_json::to_vec(&document)
            .map_err(|e| StorageError::serialization_with_source("failed to encode snapshot", e))
    }

    /// Parses a snapshot, dropping entries that expired before `now`.
    fn decode(bytes: &[u8], now: DateTime<Utc>) -> StorageResult<BTreeMap<Vec<u8>, Entry>> {
        let document: SnapshotDocument = serde_json::from_slice(bytes)
            .map_err(|e| StorageError::serialization_with_source("failed to decode snapshot", e))?;

        if document.version != SNAPSHOT_VERSION {
            return Err(StorageError::serialization(format!(
                "unsupported snapshot version {}",
                document.version
            )));
        }

        let mut entries = BTreeMap::new();
        for raw in document.entries {
            let expires_at = match raw.expires_at_ms {
                Some(ms) => Some(DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
                    StorageError::serialization(format!("invalid expiry timestamp {ms}"))
                })?),
                None => None,
            };
            let key = STANDARD.decode(&raw.key).map_err(|e| {
                StorageError::serialization_with_source("invalid base64 key in snapshot", e)
            })?;
            let value = STANDARD.decode(&raw.value).map_err(|e| {
                StorageError::serialization_with_source("invalid base64 value in snapshot", e)
            })?;

            let entry = Entry { value: Bytes::from(value), expires_at };
            if entry.is_live(now) {
                entries.insert(key, entry);
            }
        }

        Ok(entries)
    }

    /// Reads the snapshot. A missing file is an empty store.
    pub(crate) async fn load(&self, now: DateTime<Utc>) -> StorageResult<BTreeMap<Vec<u8>, Entry>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Self::decode(&bytes, now),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::internal_with_source(
                format!("failed to read snapshot {}", self.path.display()),
                e,
            )),
        }
    }

    /// Atomically replaces the snapshot with `bytes`.
    pub(crate) async fn write(&self, bytes: Vec<u8>) -> StorageResult<()> {
        let tmp = self.temp_path();
        let io_err = |what: &str, e: std::io::Error| {
            StorageError::internal_with_source(format!("failed to {what} {}", tmp.display()), e)
        };

        tokio::fs::write(&tmp, &bytes).await.map_err(|e| io_err("write", e))?;
        tokio::fs::File::open(&tmp)
            .await
            .map_err(|e| io_err("open", e))?
            .sync_all()
            .await
            .map_err(|e| io_err("sync", e))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| io_err("rename", e))
    }

    /// Verifies the directory holding the snapshot is reachable.
    pub(crate) async fn check(&self) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let metadata = tokio::fs::metadata(dir).await.map_err(|e| {
            StorageError::internal_with_source(format!("snapshot directory {} unreachable", dir.display()), e)
        })?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(StorageError::internal(format!("{} is not a directory", dir.display())))
        }
    }
}

/// Durable storage backend persisting to a single snapshot file.
///
/// # Example
///
/// ```no_run
/// use credcore_storage::{FileBackend, StorageBackend};
///
/// # async fn example() -> Result<(), credcore_storage::StorageError> {
/// let backend = FileBackend::open("/var/lib/credcore/sessions.json").await?;
/// backend.set(b"key".to_vec(), b"value".to_vec()).await?;
/// backend.close().await?;
///
/// let reopened = FileBackend::open("/var/lib/credcore/sessions.json").await?;
/// assert!(reopened.get(b"key").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileBackend {
    engine: MemoryBackend,
    path: Arc<PathBuf>,
}

impl FileBackend {
    /// Opens (or creates on first commit) the snapshot at `path` with default
    /// [`SizeLimits`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if an existing snapshot is
    /// corrupt, or [`StorageError::Internal`] if it cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        Self::open_with_size_limits(path, SizeLimits::default()).await
    }

    /// Opens the snapshot at `path`, enforcing `limits` on writes.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub async fn open_with_size_limits(path: impl Into<PathBuf>, limits: SizeLimits) -> StorageResult<Self> {
        Self::open_inner(path.into(), limits, DEFAULT_SWEEP_INTERVAL).await
    }

    async fn open_inner(path: PathBuf, limits: SizeLimits, sweep_interval: Duration) -> StorageResult<Self> {
        let snapshot = SnapshotFile::new(path.clone());
        let entries = snapshot.load(Utc::now()).await?;
        info!(path = %path.display(), entries = entries.len(), "opened file storage backend");

        Ok(Self {
            engine: MemoryBackend::from_parts(entries, Some(snapshot), limits, sweep_interval),
            path: Arc::new(path),
        })
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend").field("path", &self.path).finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        self.engine.get(key).await
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.engine.set(key, value).await
    }

    async fn set_with_ttl(&self, key: Vec<u8>, value: Vec<u8>, ttl: Duration) -> StorageResult<()> {
        self.engine.set_with_ttl(key, value, ttl).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.engine.delete(key).await
    }

    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send,
    {
        self.engine.get_range(range).await
    }

    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        self.engine.transaction().await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.engine.health_check().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.engine.close().await
    }
}
