//! Conversion between typed property values and the store's string form.
//!
//! Every field is stored as a string: booleans as `"1"`/`"0"`, integers in
//! decimal, strings unchanged.

use crate::error::{ModelError, ModelResult};
use crate::schema::{PropertyDef, PropertyType};
use crate::value::Value;

/// Encodes a value into its stored string form.
pub fn encode(value: &Value) -> String {
    match value {
        Value::Boolean(true) => "1".to_string(),
        Value::Boolean(false) => "0".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::String(s) => s.clone(),
    }
}

/// Decodes a stored string as the given type.
///
/// Returns `None` only for integers that fail to parse. Any string other than
/// `"1"` decodes as boolean `false`.
pub fn decode(property_type: PropertyType, raw: &str) -> Option<Value> {
    match property_type {
        PropertyType::String => Some(Value::String(raw.to_string())),
        PropertyType::Integer => raw.parse::<i64>().ok().map(Value::Integer),
        PropertyType::Boolean => Some(Value::Boolean(raw == "1")),
    }
}

/// Decodes a stored field using its property definition.
pub fn decode_property(def: &PropertyDef, raw: &str) -> ModelResult<Value> {
    decode(def.property_type, raw).ok_or_else(|| ModelError::CorruptValue {
        property: def.name.clone(),
        expected: def.property_type,
        value: raw.to_string(),
    })
}

/// Checks a runtime value against a property's declared type.
pub fn validate(schema: &str, def: &PropertyDef, value: &Value) -> ModelResult<()> {
    if value.value_type() == def.property_type {
        Ok(())
    } else {
        Err(ModelError::TypeMismatch {
            property: def.name.clone(),
            schema: schema.to_string(),
            expected: def.property_type,
            actual: format!("{value} ({})", value.value_type()),
        })
    }
}
