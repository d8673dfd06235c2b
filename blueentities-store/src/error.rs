//! Error types for the store layer.

use blueentities_model::{ModelError, PropertyType};
use thiserror::Error;

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Result type for backing-store primitives.
pub type BackendResult<T> = Result<T, BackendError>;

/// Failures reported by a backing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The connection was shut down.
    #[error("connection closed")]
    Closed,

    /// Key holds a value of a different kind than the command expects.
    #[error("operation against key '{key}' holding the wrong kind of value")]
    WrongType { key: String },

    /// Transport or server failure.
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur in entity operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Schema rejected while building the store.
    #[error("entity schema validation failed: {0}")]
    SchemaValidation(String),

    /// Mapper configuration rejected while building the store.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No schema registered under this name.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// Property not declared by the entity's schema.
    #[error("unknown property '{property}' for entity '{entity}'")]
    UnknownProperty { entity: String, property: String },

    /// Required property absent on insert.
    #[error("missing required property '{property}' for entity '{entity}'")]
    MissingProperty { entity: String, property: String },

    /// Runtime value does not match the declared type.
    #[error("property value {actual} for {schema}.{property} expected to be {expected}")]
    TypeMismatch {
        property: String,
        schema: String,
        expected: PropertyType,
        actual: String,
    },

    /// Declared default does not match the declared type.
    #[error("default value {actual} for {schema}.{property} expected to be {expected}")]
    DefaultValueType {
        property: String,
        schema: String,
        expected: PropertyType,
        actual: String,
    },

    /// Instance does not exist.
    #[error("entity '{entity}' with id '{id}' not found")]
    NotFound { entity: String, id: String },

    /// Record hash and index set disagree.
    #[error("consistency error for entity '{entity}' id '{id}': {reason}")]
    Consistency {
        entity: String,
        id: String,
        reason: String,
    },

    /// Stored field cannot be decoded as its declared type.
    #[error("stored value '{value}' for property '{property}' is not a valid {expected}")]
    CorruptValue {
        property: String,
        expected: PropertyType,
        value: String,
    },

    /// Lower-level store failure.
    #[error("backing store error: {0}")]
    BackingStore(#[from] BackendError),
}

impl From<ModelError> for EntityError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::SchemaValidation(msg) => Self::SchemaValidation(msg),
            ModelError::UnknownEntity(entity) => Self::UnknownEntity(entity),
            ModelError::UnknownProperty { entity, property } => {
                Self::UnknownProperty { entity, property }
            }
            ModelError::TypeMismatch {
                property,
                schema,
                expected,
                actual,
            } => Self::TypeMismatch {
                property,
                schema,
                expected,
                actual,
            },
            ModelError::CorruptValue {
                property,
                expected,
                value,
            } => Self::CorruptValue {
                property,
                expected,
                value,
            },
        }
    }
}

impl EntityError {
    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn consistency(entity: &str, id: impl ToString, reason: impl Into<String>) -> Self {
        Self::Consistency {
            entity: entity.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true for failures originating in the backing store.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::BackingStore(_))
    }
}
