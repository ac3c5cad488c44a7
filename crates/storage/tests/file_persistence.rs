//! Durability tests for `FileBackend`: committed sessions survive a reopen,
//! deleted and expired ones do not.

#![allow(clippy::expect_used, clippy::panic)]

use std::time::Duration;

use credcore_storage::{
    Backend, FileBackend, StorageBackend, StorageConfig, StorageError, assert_storage_error,
    session::SessionStore,
    testutil::{insert_session, live_key_count, make_session},
};

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn reopen_sees_committed_and_not_deleted_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sessions.json");

    {
        let store = SessionStore::new(FileBackend::open(&path).await.expect("open"));
        insert_session(&store, &make_session("keep", "u1", "a"), HOUR).await.expect("insert");
        insert_session(&store, &make_session("drop", "u1", "b"), HOUR).await.expect("insert");
        insert_session(&store, &make_session("other", "u2", "c"), HOUR).await.expect("insert");

        let mut txn = store.begin().await.expect("begin");
        txn.delete("drop").await.expect("delete");
        txn.commit().await.expect("commit");

        store.close().await.expect("close");
    }

    let store = SessionStore::new(FileBackend::open(&path).await.expect("reopen"));
    assert!(store.get("keep").await.expect("get").is_some());
    assert!(store.get("drop").await.expect("get").is_none());

    let u1: Vec<_> = store.list_user("u1").await.expect("list").into_iter().map(|r| r.id).collect();
    assert_eq!(u1, vec!["keep"]);
    assert_eq!(store.list_user("u2").await.expect("list").len(), 1);
    assert_eq!(live_key_count(store.backend()).await.expect("count"), 6);
}

#[tokio::test]
async fn reopen_without_close_keeps_every_commit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sessions.json");

    let first = SessionStore::new(FileBackend::open(&path).await.expect("open"));
    insert_session(&first, &make_session("s1", "u1", "a"), HOUR).await.expect("insert");
    drop(first);

    let second = SessionStore::new(FileBackend::open(&path).await.expect("reopen"));
    assert!(second.get("s1").await.expect("get").is_some());
}

#[tokio::test]
async fn expired_sessions_are_not_restored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sessions.json");

    {
        let store = SessionStore::new(FileBackend::open(&path).await.expect("open"));
        insert_session(&store, &make_session("short", "u1", "a"), Duration::from_millis(50))
            .await
            .expect("insert");
        insert_session(&store, &make_session("long", "u1", "b"), HOUR).await.expect("insert");
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    let store = SessionStore::new(FileBackend::open(&path).await.expect("reopen"));
    assert!(store.get("short").await.expect("get").is_none());
    assert!(store.get("long").await.expect("get").is_some());
    assert_eq!(live_key_count(store.backend()).await.expect("count"), 3);
}

#[tokio::test]
async fn corrupt_snapshot_fails_to_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sessions.json");
    std::fs::write(&path, b"{ not json").expect("write");

    assert_storage_error!(FileBackend::open(&path).await, StorageError::Serialization { .. });
}

#[tokio::test]
async fn closed_file_backend_refuses_work() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = Backend::open(&StorageConfig::File { path: dir.path().join("s.json") })
        .await
        .expect("open");

    backend.close().await.expect("close");
    assert_storage_error!(backend.transaction().await, StorageError::Closed);
    assert_storage_error!(backend.health_check().await, StorageError::Closed);
}

#[tokio::test]
async fn health_check_fails_when_directory_disappears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("nested");
    std::fs::create_dir(&nested).expect("mkdir");

    let backend = FileBackend::open(nested.join("s.json")).await.expect("open");
    backend.health_check().await.expect("healthy");

    std::fs::remove_dir(&nested).expect("rmdir");
    assert_storage_error!(backend.health_check().await, StorageError::Internal { .. });
}
