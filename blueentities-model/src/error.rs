//! Error types for the model layer.

use crate::schema::PropertyType;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating schemas or values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A schema was rejected at registration.
    #[error("entity schema validation failed: {0}")]
    SchemaValidation(String),

    /// No schema is registered under this name.
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    /// The schema declares no property with this name.
    #[error("unknown property '{property}' for entity '{entity}'")]
    UnknownProperty { entity: String, property: String },

    /// A runtime value does not match its declared type.
    #[error("property value {actual} for {schema}.{property} expected to be {expected}")]
    TypeMismatch {
        property: String,
        schema: String,
        expected: PropertyType,
        actual: String,
    },

    /// A stored string cannot be decoded as the declared type.
    #[error("stored value '{value}' for property '{property}' is not a valid {expected}")]
    CorruptValue {
        property: String,
        expected: PropertyType,
        value: String,
    },
}
