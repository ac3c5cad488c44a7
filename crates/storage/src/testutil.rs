//! Shared test utilities for storage and session testing.
//!
//! Feature-gated behind `testutil` so it never reaches production builds.
//!
//! ```toml
//! [dev-dependencies]
//! credcore-storage = { path = "../storage", features = ["testutil"] }
//! ```

use std::time::Duration;

use crate::{
    StorageBackend,
    error::StorageResult,
    session::{SessionStore, StoredToken},
};

/// Builds a session record with fixed client signals.
///
/// The identity is `("X11", fingerprint, "10.0.0.1")`.
#[must_use]
pub fn make_session(id: &str, user_id: &str, fingerprint: &str) -> StoredToken {
    StoredToken::builder()
        .id(id)
        .user_id(user_id)
        .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
        .platform("X11")
        .fingerprint(fingerprint)
        .ip("10.0.0.1")
        .role("user")
        .build()
}

/// Inserts `record` in its own transaction with the given TTL.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn insert_session<B: StorageBackend>(
    store: &SessionStore<B>,
    record: &StoredToken,
    ttl: Duration,
) -> StorageResult<()> {
    let mut txn = store.begin().await?;
    txn.insert(record, ttl)?;
    txn.commit().await
}

/// Returns how many live keys a backend currently holds.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn live_key_count<B: StorageBackend>(backend: &B) -> StorageResult<usize> {
    Ok(backend.get_range(..).await?.len())
}

/// Assert that a [`StorageResult`](crate::StorageResult) is a specific
/// [`StorageError`](crate::StorageError) variant.
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use credcore_storage::{assert_storage_error, StorageError, StorageResult};
///
/// let result: StorageResult<()> = Err(StorageError::Closed);
/// assert_storage_error!(result, StorageError::Closed);
/// ```
#[macro_export]
macro_rules! assert_storage_error {
    ($result:expr, $pattern:pat $(,)?) => {
        match $result {
            Err($pattern) => {},
            Err(other) => panic!("expected {}, got: {:?}", stringify!($pattern), other),
            Ok(_) => panic!("expected {}, got Ok", stringify!($pattern)),
        }
    };
}

/// Assert that a [`StorageResult`](crate::StorageResult) is `Ok` and return
/// the inner value.
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}
