#![allow(dead_code)]

use blueentities_store::{
    EntitySchema, EntityStore, MapperConfig, MemoryStore, PropertyDef, PropertyMap, Value,
};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Routes store logs to the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// `img { filename: string, size: optional integer = 20 }`
pub fn img_schema() -> EntitySchema {
    EntitySchema::new(
        "img",
        vec![
            PropertyDef::string("filename"),
            PropertyDef::integer("size").with_default(20),
        ],
    )
}

/// `user { name: string, age: optional integer, active: optional boolean }`
pub fn user_schema() -> EntitySchema {
    EntitySchema::new(
        "user",
        vec![
            PropertyDef::string("name"),
            PropertyDef::integer("age").optional(),
            PropertyDef::boolean("active").optional(),
        ],
    )
}

pub fn props(pairs: &[(&str, Value)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub fn img(filename: &str) -> PropertyMap {
    props(&[("filename", Value::from(filename))])
}

/// Store plus a handle on its backend for inspecting raw keys.
pub fn open_store() -> (EntityStore, MemoryStore) {
    open_store_with(MapperConfig::default())
}

pub fn open_store_with(config: MapperConfig) -> (EntityStore, MemoryStore) {
    init_tracing();
    let backend = MemoryStore::new();
    let store = EntityStore::with_config(
        vec![img_schema(), user_schema()],
        config,
        Arc::new(backend.clone()),
    )
    .unwrap();
    (store, backend)
}
