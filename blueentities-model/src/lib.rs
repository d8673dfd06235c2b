//! Entity model for blueentities.
//!
//! Defines the pure, synchronous half of the mapper:
//! - [`EntitySchema`] / [`PropertyDef`]: declared record shapes
//! - [`SchemaRegistry`]: validated, immutable set of schemas
//! - [`Value`] / [`Record`]: typed property values and decoded instances
//! - [`codec`]: conversion between typed values and stored strings
//! - [`KeyCodec`]: record and index key derivation
//!
//! Nothing here performs I/O. The store crate combines these pieces with a
//! backing store to implement CRUD and pagination.

pub mod codec;
mod error;
mod keys;
mod registry;
mod schema;
mod value;

pub use error::{ModelError, ModelResult};
pub use keys::KeyCodec;
pub use registry::{SchemaRegistry, MAX_NAME_LENGTH};
pub use schema::{EntitySchema, PropertyDef, PropertyType};
pub use value::{PropertyMap, Record, Value};
