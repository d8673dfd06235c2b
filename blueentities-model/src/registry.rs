//! Validated, immutable collection of entity schemas.
//!
//! Schemas are checked once, when the registry is built. A registry that
//! exists is always valid; there is no way to add or change a schema later.

use crate::error::{ModelError, ModelResult};
use crate::schema::{EntitySchema, PropertyDef};
use blueentities_types::SEPARATOR;
use std::collections::{HashMap, HashSet};

/// Longest accepted entity or property name, in characters.
pub const MAX_NAME_LENGTH: usize = 31;

/// Property name reserved for the synthetic instance id.
const RESERVED_PROPERTY: &str = "id";

/// Entity schemas indexed by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, EntitySchema>,
    /// Registration order, for stable listing.
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Validates and registers every schema, in order.
    ///
    /// Fails on the first invalid schema; nothing is registered in that case.
    pub fn new(schemas: impl IntoIterator<Item = EntitySchema>) -> ModelResult<Self> {
        let mut registry = Self::default();
        for schema in schemas {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Parses a JSON array of schema documents and registers them.
    ///
    /// Documents missing `name`, `properties` or a property `type`, or naming
    /// an unsupported type, are rejected as schema validation failures.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let schemas: Vec<EntitySchema> = serde_json::from_str(json)
            .map_err(|e| ModelError::SchemaValidation(format!("malformed schema document: {e}")))?;
        Self::new(schemas)
    }

    fn register(&mut self, schema: EntitySchema) -> ModelResult<()> {
        self.check(&schema)?;
        self.order.push(schema.name.clone());
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    fn check(&self, schema: &EntitySchema) -> ModelResult<()> {
        if self.schemas.contains_key(&schema.name) {
            return Err(invalid(format!("schema name duplicated of '{}'", schema.name)));
        }

        if !valid_name(&schema.name) {
            return Err(invalid(format!(
                "schema name of '{}' invalid, it should have between 1 and {MAX_NAME_LENGTH} characters",
                schema.name
            )));
        }

        if schema.name.contains(SEPARATOR) {
            return Err(invalid(format!(
                "schema name of '{}' invalid, it must not contain '{SEPARATOR}'",
                schema.name
            )));
        }

        if schema.properties.is_empty() {
            return Err(invalid(format!(
                "schema '{}' set with no properties",
                schema.name
            )));
        }

        let mut seen = HashSet::new();
        for property in &schema.properties {
            check_property(&schema.name, property)?;
            if !seen.insert(property.name.as_str()) {
                return Err(invalid(format!(
                    "schema '{}' declares property '{}' more than once",
                    schema.name, property.name
                )));
            }
        }

        Ok(())
    }

    /// Returns the schema registered under `entity`.
    pub fn schema(&self, entity: &str) -> ModelResult<&EntitySchema> {
        self.schemas
            .get(entity)
            .ok_or_else(|| ModelError::UnknownEntity(entity.to_string()))
    }

    /// Returns the definition of one property of one entity.
    pub fn lookup(&self, entity: &str, property: &str) -> ModelResult<&PropertyDef> {
        self.schema(entity)?
            .property(property)
            .ok_or_else(|| ModelError::UnknownProperty {
                entity: entity.to_string(),
                property: property.to_string(),
            })
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.schemas.contains_key(entity)
    }

    /// Entity names in registration order.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn check_property(entity: &str, property: &PropertyDef) -> ModelResult<()> {
    if !valid_name(&property.name) {
        return Err(invalid(format!(
            "schema '{entity}' set with property name invalid, properties names should have between 1 and {MAX_NAME_LENGTH} characters"
        )));
    }

    if property.name == RESERVED_PROPERTY {
        return Err(invalid(format!(
            "schema '{entity}' uses reserved property name '{RESERVED_PROPERTY}'"
        )));
    }

    Ok(())
}

fn valid_name(name: &str) -> bool {
    (1..=MAX_NAME_LENGTH).contains(&name.chars().count())
}

fn invalid(msg: String) -> ModelError {
    ModelError::SchemaValidation(msg)
}
