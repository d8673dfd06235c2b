//! Entity mapper over a key-value server.
//!
//! Persists schema-described records as field-hashes and keeps one ordered
//! index set per entity so instances can be counted and paged.
//!
//! # Architecture
//!
//! - [`BackingStore`] is the seam to the server; [`RedisStore`] talks to Redis and [`MemoryStore`] runs in-process
//! - [`EntityStore`] validates values against registered schemas and issues the writes
//! - Records live at `[namespace:]entity:id`, indexes at `[namespace:]entity:set`
//! - Index members all score 0, so rank order is lexicographic by record key
//! - Multi-key operations are not atomic; [`EntityStore::repair_index`] cleans up after partial removes

mod backend;
mod config;
mod entity_store;
mod error;
mod memory;
mod pagination;
mod redis_store;

pub use backend::BackingStore;
pub use config::{ConnectionConfig, DEFAULT_PAGE_SIZE, DEFAULT_REDIS_URL, MapperConfig};
pub use entity_store::{EntityStore, ServerInfo};
pub use error::{BackendError, BackendResult, EntityError, EntityResult};
pub use memory::MemoryStore;
pub use pagination::PagePlan;
pub use redis_store::RedisStore;

pub use blueentities_model::{
    EntitySchema, PropertyDef, PropertyMap, PropertyType, Record, SchemaRegistry, Value,
};
pub use blueentities_types::EntityId;
