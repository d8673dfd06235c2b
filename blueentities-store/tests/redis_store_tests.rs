//! Live tests need a Redis server and are skipped unless `REDIS_URL` is set.

mod common;

use blueentities_store::{
    BackendError, BackingStore, ConnectionConfig, EntityError, EntityId, EntityStore,
    MapperConfig, RedisStore, DEFAULT_REDIS_URL,
};
use common::{img, img_schema, init_tracing};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn redis_url() -> Option<String> {
    std::env::var("REDIS_URL").ok()
}

/// Connects under a throwaway namespace so runs never collide.
async fn live_store(url: &str) -> (EntityStore, Arc<RedisStore>) {
    init_tracing();
    let backend = Arc::new(RedisStore::connect(&ConnectionConfig::new(url)).await.unwrap());
    let config = MapperConfig {
        namespace: Some(format!("bet{}", EntityId::new())),
        ..Default::default()
    };
    let store = EntityStore::with_config(vec![img_schema()], config, backend.clone()).unwrap();
    (store, backend)
}

// ── Connection config ───────────────────────────────────────────

#[test]
fn connection_defaults_to_local_server() {
    assert_eq!(ConnectionConfig::default().url, DEFAULT_REDIS_URL);
    assert_eq!(MapperConfig::default().connection.url, DEFAULT_REDIS_URL);
}

#[test]
fn connection_url_read_from_config_document() {
    let config: MapperConfig =
        serde_json::from_str(r#"{"connection":{"url":"redis://cache:6380/1"}}"#).unwrap();
    assert_eq!(config.connection, ConnectionConfig::new("redis://cache:6380/1"));
    assert_eq!(config.page_size, 25);
}

// ── Connection failure ──────────────────────────────────────────

#[tokio::test]
async fn malformed_url_is_unavailable() {
    let result = RedisStore::connect(&ConnectionConfig::new("not a redis url")).await;
    assert!(matches!(result, Err(BackendError::Unavailable(_))));
}

#[tokio::test]
async fn unsupported_scheme_is_unavailable() {
    let result = RedisStore::connect(&ConnectionConfig::new("http://127.0.0.1:6379")).await;
    assert!(matches!(result, Err(BackendError::Unavailable(_))));
}

#[tokio::test]
async fn entity_store_connect_surfaces_backend_failure() {
    let config = MapperConfig {
        connection: ConnectionConfig::new("not a redis url"),
        ..Default::default()
    };
    let err = EntityStore::connect(vec![img_schema()], config)
        .await
        .err()
        .unwrap();
    assert!(err.is_backend());
    assert!(matches!(
        err,
        EntityError::BackingStore(BackendError::Unavailable(_))
    ));
}

#[tokio::test]
async fn entity_store_connect_checks_schemas_first() {
    let config = MapperConfig {
        connection: ConnectionConfig::new("not a redis url"),
        ..Default::default()
    };
    let err = EntityStore::connect(vec![img_schema(), img_schema()], config)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, EntityError::SchemaValidation(_)));
}

// ── Live server ─────────────────────────────────────────────────

#[tokio::test]
async fn live_connect_and_server_info() {
    let Some(url) = redis_url() else {
        eprintln!("Skipping Redis test: REDIS_URL not set");
        return;
    };
    let (store, _) = live_store(&url).await;

    let info = store.server_info().await.unwrap();
    assert_eq!(info["backend"], "redis");
    assert!(info.contains_key("redis_version"));
    assert_eq!(info["entities"], "img");
}

#[tokio::test]
async fn live_add_get_remove() {
    let Some(url) = redis_url() else {
        eprintln!("Skipping Redis test: REDIS_URL not set");
        return;
    };
    let (store, _) = live_store(&url).await;

    let id = store.add_entity("img", img("a.png"), None).await.unwrap();
    let record = store.get_entity("img", &id).await.unwrap();
    assert_eq!(record.get_str("filename"), Some("a.png"));
    assert_eq!(record.get_integer("size"), Some(20));
    assert_eq!(store.get_count("img").await.unwrap(), 1);

    store.remove_entity("img", &id).await.unwrap();
    assert!(!store.exists_entity("img", &id).await.unwrap());
    assert!(matches!(
        store.remove_entity("img", &id).await,
        Err(EntityError::NotFound { .. })
    ));
}

#[tokio::test]
async fn live_range_is_lexicographic() {
    let Some(url) = redis_url() else {
        eprintln!("Skipping Redis test: REDIS_URL not set");
        return;
    };
    let (store, _) = live_store(&url).await;

    for name in ["c", "a", "b"] {
        store
            .add_entity("img", img(name), Some(EntityId::parse(name).unwrap()))
            .await
            .unwrap();
    }
    let ids: Vec<_> = store
        .get_range("img", 0, -1)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id.to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let ids: Vec<_> = ["a", "b", "c"].iter().map(|s| EntityId::parse(s).unwrap()).collect();
    store.remove_entities("img", &ids).await.unwrap();
}

#[tokio::test]
async fn live_wrong_kind_of_key() {
    let Some(url) = redis_url() else {
        eprintln!("Skipping Redis test: REDIS_URL not set");
        return;
    };
    let (_, backend) = live_store(&url).await;
    let key = format!("bet{}:set", EntityId::new());

    backend.sorted_set_add(&key, "m", 0).await.unwrap();
    let err = backend.hash_get_all(&key).await.unwrap_err();
    assert_eq!(err, BackendError::WrongType { key: key.clone() });
    backend.delete(&key).await.unwrap();
}

#[tokio::test]
async fn live_shutdown_fails_later_calls() {
    let Some(url) = redis_url() else {
        eprintln!("Skipping Redis test: REDIS_URL not set");
        return;
    };
    let (store, backend) = live_store(&url).await;

    store.shutdown().await.unwrap();
    assert!(backend.is_closed());
    assert_eq!(
        store.get_count("img").await.unwrap_err(),
        EntityError::BackingStore(BackendError::Closed)
    );
}
