use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares the shape of one entity type.
///
/// The JSON form matches the schema documents used by existing deployments:
/// `{"name": "img", "properties": [{"name": "size", "type": "integer",
/// "optional": true, "defaultValue": 20}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    pub properties: Vec<PropertyDef>,
}

impl EntitySchema {
    /// Creates a schema from a name and ordered property list.
    pub fn new(name: impl Into<String>, properties: Vec<PropertyDef>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Looks up a property definition by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// One declared field of an entity schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default)]
    pub optional: bool,
    /// Value stored when an optional property is omitted.
    #[serde(
        default,
        rename = "defaultValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<Value>,
}

impl PropertyDef {
    fn required(name: &str, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            optional: false,
            default_value: None,
        }
    }

    /// Shorthand for a required string property.
    pub fn string(name: &str) -> Self {
        Self::required(name, PropertyType::String)
    }

    /// Shorthand for a required integer property.
    pub fn integer(name: &str) -> Self {
        Self::required(name, PropertyType::Integer)
    }

    /// Shorthand for a required boolean property.
    pub fn boolean(name: &str) -> Self {
        Self::required(name, PropertyType::Boolean)
    }

    /// Marks the property optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the property optional with a default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.optional = true;
        self.default_value = Some(value.into());
        self
    }
}

/// The declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Boolean,
}

impl PropertyType {
    /// Returns the type name used in schema documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    /// Value substituted for an omitted optional property without a default.
    pub fn zero_value(self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Integer => Value::Integer(0),
            Self::Boolean => Value::Boolean(false),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
