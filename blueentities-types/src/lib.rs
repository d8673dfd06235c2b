//! Core type definitions for blueentities.
//!
//! This crate defines the identifier types shared by the model and store
//! crates:
//! - [`EntityId`]: short, separator-free instance identifiers
//! - [`SEPARATOR`]: the character joining key segments in the backing store
//! - [`INDEX_SUFFIX`]: the last segment of index-set keys, never a valid id
//!
//! Ids never contain the separator. Record keys are split on the last
//! separator to recover the id, so this crate is where that contract lives.

mod ids;

pub use ids::{EntityId, ID_LENGTH, MAX_ID_LENGTH};

/// Character separating namespace, entity name and id in store keys.
pub const SEPARATOR: char = ':';

/// Final key segment of an entity's index set. Reserved as an id.
pub const INDEX_SUFFIX: &str = "set";

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid entity id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },
}
