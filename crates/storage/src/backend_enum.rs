//! Unified backend enum.
//!
//! [`Backend`] wraps every backend in this crate so the choice can be made
//! at runtime from [`StorageConfig`] while keeping static dispatch.
//!
//! | Variant | Use Case |
//! |---------|----------|
//! | [`Backend::Memory`] | Testing, development |
//! | [`Backend::File`] | Single-node deployments needing durability |
//!
//! # Usage
//!
//! ```
//! use credcore_storage::{Backend, StorageBackend, StorageConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let backend = Backend::open(&StorageConfig::Memory).await.unwrap();
//! backend.set(b"key".to_vec(), b"value".to_vec()).await.unwrap();
//! assert!(backend.is_memory());
//! # });
//! ```

use std::{ops::RangeBounds, path::PathBuf, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    FileBackend, MemoryBackend, StorageBackend, StorageResult, Transaction, types::KeyValue,
};

/// Where the session store keeps its data.
///
/// ```
/// use credcore_storage::StorageConfig;
///
/// let config: StorageConfig =
///     serde_json::from_str(r#"{"type":"file","path":"/tmp/sessions.json"}"#).unwrap();
/// assert!(matches!(config, StorageConfig::File { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum StorageConfig {
    /// Volatile in-memory store.
    #[default]
    Memory,
    /// Durable snapshot file at `path`.
    File {
        /// Snapshot file location.
        path: PathBuf,
    },
}

/// Unified storage backend enum.
#[derive(Clone)]
pub enum Backend {
    /// In-memory backend for testing and development
    Memory(MemoryBackend),
    /// Durable single-file backend
    File(FileBackend),
}

impl Backend {
    /// Opens the backend described by `config`.
    ///
    /// # Errors
    ///
    /// Propagates [`FileBackend::open`] failures.
    pub async fn open(config: &StorageConfig) -> StorageResult<Self> {
        match config {
            StorageConfig::Memory => Ok(Self::memory()),
            StorageConfig::File { path } => Ok(Self::File(FileBackend::open(path.clone()).await?)),
        }
    }

    /// Create a new memory backend
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryBackend::new())
    }

    /// Returns true if this is a memory backend
    #[must_use]
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory(_))
    }
}

impl From<MemoryBackend> for Backend {
    fn from(backend: MemoryBackend) -> Self {
        Self::Memory(backend)
    }
}

impl From<FileBackend> for Backend {
    fn from(backend: FileBackend) -> Self {
        Self::File(backend)
    }
}

#[async_trait]
impl StorageBackend for Backend {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        match self {
            Self::Memory(b) => b.get(key).await,
            Self::File(b) => b.get(key).await,
        }
    }

    async fn set(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        match self {
            Self::Memory(b) => b.set(key, value).await,
            Self::File(b) => b.set(key, value).await,
        }
    }

    async fn set_with_ttl(&self, key: Vec<u8>, value: Vec<u8>, ttl: Duration) -> StorageResult<()> {
        match self {
            Self::Memory(b) => b.set_with_ttl(key, value, ttl).await,
            Self::File(b) => b.set_with_ttl(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        match self {
            Self::Memory(b) => b.delete(key).await,
            Self::File(b) => b.delete(key).await,
        }
    }

    async fn get_range<R>(&self, range: R) -> StorageResult<Vec<KeyValue>>
    where
        R: RangeBounds<Vec<u8>> + Send,
    {
        match self {
            Self::Memory(b) => b.get_range(range).await,
            Self::File(b) => b.get_range(range).await,
        }
    }

    async fn transaction(&self) -> StorageResult<Box<dyn Transaction>> {
        match self {
            Self::Memory(b) => b.transaction().await,
            Self::File(b) => b.transaction().await,
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        match self {
            Self::Memory(b) => b.health_check().await,
            Self::File(b) => b.health_check().await,
        }
    }

    async fn close(&self) -> StorageResult<()> {
        match self {
            Self::Memory(b) => b.close().await,
            Self::File(b) => b.close().await,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory(_) => write!(f, "Backend::Memory"),
            Self::File(b) => write!(f, "Backend::File({})", b.path().display()),
        }
    }
}
