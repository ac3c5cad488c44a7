//! Integration test verifying that `#[instrument]` annotations on the session
//! store produce the expected spans.

#![allow(clippy::expect_used)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use credcore_storage::{
    MemoryBackend,
    session::SessionStore,
    testutil::{insert_session, make_session},
};
use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, registry::LookupSpan};

// ---------------------------------------------------------------------------
// Collecting layer, records span names as they are created
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct SpanCollector {
    spans: Arc<Mutex<Vec<String>>>,
}

impl<S> tracing_subscriber::Layer<S> for SpanCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Some(span) = ctx.span(id) {
            self.spans.lock().expect("lock poisoned").push(span.name().to_owned());
        }
    }
}

#[tokio::test]
async fn index_operations_create_spans() {
    let collector = SpanCollector::default();
    let spans = Arc::clone(&collector.spans);

    let subscriber = tracing_subscriber::registry().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    let store = SessionStore::new(MemoryBackend::new());
    let record = make_session("s1", "u1", "fp");
    insert_session(&store, &record, Duration::from_secs(60)).await.expect("insert");

    let _ = store.list_user("u1").await.expect("list");

    let mut txn = store.begin().await.expect("begin");
    txn.evict_identity(&record.identity()).await.expect("evict");
    txn.delete_user("u1").await.expect("delete_user");
    txn.commit().await.expect("commit");

    let recorded = spans.lock().expect("lock poisoned");
    for name in ["list_user", "evict_identity", "delete_user"] {
        assert!(recorded.iter().any(|s| s == name), "missing span '{name}', recorded: {recorded:?}");
    }
}
