//! Transactional, indexed key-value storage for credcore refresh sessions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Token Service                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   session::SessionStore                     │
//! │     StoredToken records, identity index, user index         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   StorageBackend trait                      │
//! │  (get, set_with_ttl, delete, get_range, transaction, close) │
//! ├──────────────┬──────────────────────────────────────────────┤
//! │ MemoryBackend│            FileBackend                       │
//! │  (volatile)  │   (same engine + JSON snapshot file)         │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! Most callers go through [`session::SessionStore`], which keeps the
//! primary record and both indexes in step:
//!
//! ```
//! use std::time::Duration;
//!
//! use credcore_storage::{MemoryBackend, session::{SessionStore, StoredToken}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SessionStore::new(MemoryBackend::new());
//!     let record = StoredToken::builder()
//!         .id("7f9c")
//!         .user_id("user-1")
//!         .user_agent("curl/8.5.0")
//!         .platform("curl")
//!         .fingerprint("fp")
//!         .ip("203.0.113.7")
//!         .role("user")
//!         .build();
//!
//!     let mut txn = store.begin().await?;
//!     txn.evict_identity(&record.identity()).await?;
//!     txn.insert(&record, Duration::from_secs(3600))?;
//!     txn.commit().await?;
//!
//!     assert_eq!(store.list_user("user-1").await?.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! # Available Backends
//!
//! | Backend | Use Case | Persistence |
//! |---------|----------|-------------|
//! | [`MemoryBackend`] | Testing, development | No |
//! | [`FileBackend`] | Single-node deployments | Snapshot file |
//! | [`Backend`] | Runtime selection from [`StorageConfig`] | Either |
//!
//! # Feature Flags
//!
//! - **`testutil`**: enables the `testutil` module with session fixtures and assertion macros.

#![deny(unsafe_code)]

pub mod backend;
pub mod backend_enum;
pub mod error;
pub mod file;
pub mod memory;
pub mod session;
pub mod size_limits;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod transaction;
pub mod types;

pub use backend::StorageBackend;
pub use backend_enum::{Backend, StorageConfig};
pub use error::{BoxError, ConfigError, StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::{DEFAULT_SWEEP_INTERVAL, MemoryBackend};
pub use size_limits::{DEFAULT_MAX_KEY_SIZE, DEFAULT_MAX_VALUE_SIZE, SizeLimits};
pub use transaction::Transaction;
pub use types::{KeyValue, prefix_range};
