//! Connection registry behavior tests.
//!
//! Pools are created lazily, so none of these tests need a running
//! PostgreSQL server: pool identity and registry bookkeeping are observable
//! through `Pool::connect_options()` without ever connecting.

use sqlkit::{ConnectionRegistry, ConnectionSettings, DebugSink, SqlError};
use std::sync::{Arc, Mutex};

fn settings(host: &str) -> ConnectionSettings {
    ConnectionSettings::new(host, "postgres", "postgres", "postgres")
}

#[tokio::test]
async fn same_name_returns_identical_pool_and_ignores_new_config() {
    let registry = ConnectionRegistry::new();
    let first = registry
        .get_or_create(Some(settings("first-host")), Some("main"))
        .await
        .unwrap();
    let second = registry
        .get_or_create(Some(settings("second-host")), Some("main"))
        .await
        .unwrap();

    // Cache hit: the original pool, still configured with the first host.
    assert!(Arc::ptr_eq(
        &first.connect_options(),
        &second.connect_options()
    ));
    assert_eq!(second.connect_options().get_host(), "first-host");
    assert_eq!(registry.pool_count().await, 1);
}

#[tokio::test]
async fn omitted_name_registers_under_default() {
    let registry = ConnectionRegistry::new();
    registry
        .get_or_create(Some(settings("localhost")), None)
        .await
        .unwrap();
    assert!(registry.contains(sqlkit::DEFAULT_CONNECTION).await);
}

#[tokio::test]
async fn close_unknown_name_reports_not_found() {
    let registry = ConnectionRegistry::new();
    let err = registry.close(Some("missing")).await.unwrap_err();
    assert!(matches!(err, SqlError::ConnectionNotFound { name } if name == "missing"));

    // A failed close leaves the registry untouched.
    assert_eq!(registry.pool_count().await, 0);
}

#[tokio::test]
async fn close_then_create_builds_fresh_pool() {
    let registry = ConnectionRegistry::new();
    registry
        .get_or_create(Some(settings("old-host")), Some("jobs"))
        .await
        .unwrap();
    registry.close(Some("jobs")).await.unwrap();
    assert!(!registry.contains("jobs").await);

    let fresh = registry
        .get_or_create(Some(settings("new-host")), Some("jobs"))
        .await
        .unwrap();
    assert_eq!(fresh.connect_options().get_host(), "new-host");
}

#[tokio::test]
async fn concurrent_create_yields_exactly_one_pool() {
    let registry = Arc::new(ConnectionRegistry::new());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            registry
                .get_or_create(Some(settings("race-host")), Some("race"))
                .await
                .unwrap()
        }));
    }

    let mut pools = Vec::new();
    for handle in handles {
        pools.push(handle.await.unwrap());
    }

    assert_eq!(registry.pool_count().await, 1);
    let first = pools[0].connect_options();
    for pool in &pools[1..] {
        assert!(Arc::ptr_eq(&first, &pool.connect_options()));
    }
}

#[tokio::test]
async fn close_all_empties_registry() {
    let registry = ConnectionRegistry::new();
    registry
        .get_or_create(Some(settings("a")), Some("a"))
        .await
        .unwrap();
    registry
        .get_or_create(Some(settings("b")), Some("b"))
        .await
        .unwrap();
    assert_eq!(registry.pool_count().await, 2);

    registry.close_all().await;
    assert_eq!(registry.pool_count().await, 0);
}

struct CapturingSink {
    payloads: Mutex<Vec<serde_json::Value>>,
}

impl DebugSink for CapturingSink {
    fn debug(&self, payload: &serde_json::Value) {
        self.payloads.lock().unwrap().push(payload.clone());
    }
}

#[tokio::test]
async fn pool_creation_logs_config_without_password() {
    let sink = Arc::new(CapturingSink {
        payloads: Mutex::new(Vec::new()),
    });
    let registry = ConnectionRegistry::with_debug_sink(sink.clone());
    registry
        .get_or_create(Some(settings("log-host")), Some("logged"))
        .await
        .unwrap();

    let payloads = sink.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    let config = &payloads[0]["config"];
    assert_eq!(config["host"], "log-host");
    assert!(config.get("password").is_none());

    // Cache hit: nothing new is logged.
    drop(payloads);
    registry
        .get_or_create(None, Some("logged"))
        .await
        .unwrap();
    assert_eq!(sink.payloads.lock().unwrap().len(), 1);
}
