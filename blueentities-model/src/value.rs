use crate::schema::PropertyType;
use blueentities_types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Property values supplied to the store, keyed by property name.
pub type PropertyMap = BTreeMap<String, Value>;

/// A typed property value.
///
/// Untagged so JSON scalars map directly: `"a.png"`, `20`, `true`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl Value {
    /// Returns the property type this value satisfies.
    pub const fn value_type(&self) -> PropertyType {
        match self {
            Self::String(_) => PropertyType::String,
            Self::Integer(_) => PropertyType::Integer,
            Self::Boolean(_) => PropertyType::Boolean,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{s}'"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// A decoded entity instance read back from the store.
///
/// Serializes as a flat object with the id alongside the properties, the
/// same shape callers supply on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: EntityId,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: EntityId, properties: BTreeMap<String, Value>) -> Self {
        Self { id, properties }
    }

    /// Returns a property value by name.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    /// Returns a string property by name.
    pub fn get_str(&self, property: &str) -> Option<&str> {
        self.get(property).and_then(Value::as_str)
    }

    /// Returns an integer property by name.
    pub fn get_integer(&self, property: &str) -> Option<i64> {
        self.get(property).and_then(Value::as_integer)
    }

    /// Returns a boolean property by name.
    pub fn get_bool(&self, property: &str) -> Option<bool> {
        self.get(property).and_then(Value::as_bool)
    }
}
