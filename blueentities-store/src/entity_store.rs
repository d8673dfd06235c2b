//! Schema-checked CRUD over the backing store.
//!
//! Each instance lives in two places: a field-hash at its record key and a
//! membership in its entity's index set. Inserts write both, deletes remove
//! both, and neither is atomic across the two structures. A reader can see
//! an index entry whose hash is gone, or a hash not yet indexed.

use crate::backend::BackingStore;
use crate::config::MapperConfig;
use crate::error::{EntityError, EntityResult};
use crate::redis_store::RedisStore;
use blueentities_model::codec;
use blueentities_model::{
    EntitySchema, KeyCodec, PropertyMap, Record, SchemaRegistry, Value,
};
use blueentities_types::EntityId;
use futures::StreamExt;
use futures::future::join_all;
use futures::stream::FuturesUnordered;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Diagnostic key/value pairs returned by [`EntityStore::server_info`].
pub type ServerInfo = BTreeMap<String, String>;

/// Entity mapper bound to one backing store.
///
/// Cheap to clone; clones share the registry and the backend handle.
#[derive(Clone)]
pub struct EntityStore {
    pub(crate) registry: Arc<SchemaRegistry>,
    pub(crate) keys: KeyCodec,
    pub(crate) config: MapperConfig,
    pub(crate) backend: Arc<dyn BackingStore>,
}

impl EntityStore {
    /// Creates a store with the default configuration.
    ///
    /// Schemas are validated before anything else happens; an invalid schema
    /// returns `EntityError::SchemaValidation` and no store is built.
    pub fn new(
        schemas: impl IntoIterator<Item = EntitySchema>,
        backend: Arc<dyn BackingStore>,
    ) -> EntityResult<Self> {
        Self::with_config(schemas, MapperConfig::default(), backend)
    }

    /// Creates a store with an explicit configuration.
    pub fn with_config(
        schemas: impl IntoIterator<Item = EntitySchema>,
        config: MapperConfig,
        backend: Arc<dyn BackingStore>,
    ) -> EntityResult<Self> {
        let registry = SchemaRegistry::new(schemas)?;
        Self::from_registry(registry, config, backend)
    }

    /// Validates the schemas, then connects to the Redis server named by
    /// `config.connection`.
    ///
    /// An unreachable server fails with `EntityError::BackingStore`.
    pub async fn connect(
        schemas: impl IntoIterator<Item = EntitySchema>,
        config: MapperConfig,
    ) -> EntityResult<Self> {
        let registry = SchemaRegistry::new(schemas)?;
        config.validate()?;
        let backend = RedisStore::connect(&config.connection).await?;
        Self::from_registry(registry, config, Arc::new(backend))
    }

    /// Creates a store around an already validated registry.
    pub fn from_registry(
        registry: SchemaRegistry,
        config: MapperConfig,
        backend: Arc<dyn BackingStore>,
    ) -> EntityResult<Self> {
        config.validate()?;
        let keys = KeyCodec::new(config.namespace.as_deref());
        info!(
            entities = registry.len(),
            namespace = ?config.namespace,
            backend = backend.backend_name(),
            "entity store opened"
        );
        Ok(Self {
            registry: Arc::new(registry),
            keys,
            config,
            backend,
        })
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Returns a fresh id suitable for [`Self::add_entity`].
    pub fn get_unique_id(&self) -> EntityId {
        EntityId::new()
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Inserts one instance and returns its id.
    ///
    /// Omitted optional properties take their declared default, or the type's
    /// zero value when none is declared. All validation happens before the
    /// first write, so a rejected call leaves the store untouched. When `id`
    /// is given and already exists, every field is overwritten.
    pub async fn add_entity(
        &self,
        entity: &str,
        properties: PropertyMap,
        id: Option<EntityId>,
    ) -> EntityResult<EntityId> {
        let schema = self.registry.schema(entity)?;
        let fields = prepare_fields(schema, properties)?;

        let id = id.unwrap_or_default();
        let record_key = self.keys.record_key(entity, &id);
        let index_key = self.keys.index_key(entity);

        let backend = self.backend.as_ref();
        let field_writes = fields
            .iter()
            .map(|(field, value)| backend.hash_set(&record_key, field, value));
        let (written, indexed) = tokio::join!(
            join_all(field_writes),
            backend.sorted_set_add(&index_key, &record_key, 0),
        );
        for result in written {
            result?;
        }
        indexed?;

        debug!(entity, %id, fields = fields.len(), "entity added");
        Ok(id)
    }

    /// Inserts many instances concurrently, returning ids in input order.
    ///
    /// Every insert runs to completion; the first failure observed is
    /// returned and instances already written stay written.
    pub async fn add_entities(
        &self,
        entity: &str,
        items: Vec<PropertyMap>,
    ) -> EntityResult<Vec<EntityId>> {
        fan_out(
            items
                .into_iter()
                .map(|properties| self.add_entity(entity, properties, None)),
        )
        .await
    }

    /// Overwrites a single property of an existing instance.
    pub async fn update_entity_value(
        &self,
        entity: &str,
        id: &EntityId,
        property: &str,
        value: Value,
    ) -> EntityResult<()> {
        let def = self.registry.lookup(entity, property)?;
        codec::validate(entity, def, &value)?;

        let key = self.keys.record_key(entity, id);
        if !self.backend.exists(&key).await? {
            return Err(EntityError::not_found(entity, id));
        }
        // The instance may be removed between the check and this write,
        // leaving an unindexed one-field hash behind.
        self.backend
            .hash_set(&key, property, &codec::encode(&value))
            .await?;

        debug!(entity, %id, property, "entity value updated");
        Ok(())
    }

    /// Removes an instance's hash, then its index membership.
    ///
    /// The second step only runs after the first succeeded. A failure between
    /// them leaves a dangling index entry; see [`Self::repair_index`].
    pub async fn remove_entity(&self, entity: &str, id: &EntityId) -> EntityResult<()> {
        self.registry.schema(entity)?;
        let record_key = self.keys.record_key(entity, id);
        let index_key = self.keys.index_key(entity);

        match self.backend.delete(&record_key).await? {
            0 => return Err(EntityError::not_found(entity, id)),
            1 => {}
            n => {
                return Err(EntityError::consistency(
                    entity,
                    id,
                    format!("delete affected {n} records"),
                ));
            }
        }

        let unindexed = self
            .backend
            .sorted_set_remove(&index_key, &record_key)
            .await?;
        if unindexed != 1 {
            warn!(entity, %id, unindexed, "record removed but index entry was not");
            return Err(EntityError::consistency(
                entity,
                id,
                format!("index removal affected {unindexed} members"),
            ));
        }

        debug!(entity, %id, "entity removed");
        Ok(())
    }

    /// Removes many instances concurrently.
    ///
    /// Like [`Self::add_entities`], reports the first failure and undoes nothing.
    pub async fn remove_entities(&self, entity: &str, ids: &[EntityId]) -> EntityResult<()> {
        fan_out(ids.iter().map(|id| self.remove_entity(entity, id))).await?;
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Reads and decodes one instance.
    pub async fn get_entity(&self, entity: &str, id: &EntityId) -> EntityResult<Record> {
        let schema = self.registry.schema(entity)?;
        let key = self.keys.record_key(entity, id);
        let fields = self
            .backend
            .hash_get_all(&key)
            .await?
            .filter(|fields| !fields.is_empty())
            .ok_or_else(|| EntityError::not_found(entity, id))?;
        decode_record(schema, id.clone(), fields)
    }

    /// Whether an instance's hash exists.
    pub async fn exists_entity(&self, entity: &str, id: &EntityId) -> EntityResult<bool> {
        self.registry.schema(entity)?;
        Ok(self.backend.exists(&self.keys.record_key(entity, id)).await?)
    }

    /// Number of members in the entity's index set.
    pub async fn get_count(&self, entity: &str) -> EntityResult<u64> {
        self.registry.schema(entity)?;
        Ok(self
            .backend
            .sorted_set_cardinality(&self.keys.index_key(entity))
            .await?)
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Backend diagnostics plus the mapper's own settings.
    pub async fn server_info(&self) -> EntityResult<ServerInfo> {
        let mut info = self.backend.info().await?;
        info.insert(
            "namespace".to_string(),
            self.keys.namespace().unwrap_or_default().to_string(),
        );
        info.insert(
            "entities".to_string(),
            self.registry.entity_names().collect::<Vec<_>>().join(","),
        );
        info.insert("page_size".to_string(), self.config.page_size.to_string());
        Ok(info)
    }

    /// Releases the backend connection.
    ///
    /// The handle is shared by every clone of this store; operations issued
    /// afterwards, or still in flight, fail with a backing-store error.
    pub async fn shutdown(&self) -> EntityResult<()> {
        info!(backend = self.backend.backend_name(), "entity store shutting down");
        self.backend.close().await?;
        Ok(())
    }
}

/// Resolves defaults, validates every value and encodes the result in
/// schema order.
fn prepare_fields(
    schema: &EntitySchema,
    mut properties: PropertyMap,
) -> EntityResult<Vec<(String, String)>> {
    for def in &schema.properties {
        if properties.contains_key(&def.name) {
            continue;
        }
        if !def.optional {
            return Err(EntityError::MissingProperty {
                entity: schema.name.clone(),
                property: def.name.clone(),
            });
        }
        let value = match &def.default_value {
            Some(default) if default.value_type() != def.property_type => {
                return Err(EntityError::DefaultValueType {
                    property: def.name.clone(),
                    schema: schema.name.clone(),
                    expected: def.property_type,
                    actual: format!("{default} ({})", default.value_type()),
                });
            }
            Some(default) => default.clone(),
            None => def.property_type.zero_value(),
        };
        properties.insert(def.name.clone(), value);
    }

    for (name, value) in &properties {
        let def = schema
            .property(name)
            .ok_or_else(|| EntityError::UnknownProperty {
                entity: schema.name.clone(),
                property: name.clone(),
            })?;
        codec::validate(&schema.name, def, value)?;
    }

    Ok(schema
        .properties
        .iter()
        .filter_map(|def| {
            properties
                .get(&def.name)
                .map(|value| (def.name.clone(), codec::encode(value)))
        })
        .collect())
}

/// Decodes a stored hash. Fields the schema does not declare are skipped.
pub(crate) fn decode_record(
    schema: &EntitySchema,
    id: EntityId,
    fields: HashMap<String, String>,
) -> EntityResult<Record> {
    let mut properties = BTreeMap::new();
    for (name, raw) in fields {
        match schema.property(&name) {
            Some(def) => {
                properties.insert(name, codec::decode_property(def, &raw)?);
            }
            None => warn!(entity = %schema.name, %id, field = %name, "skipping undeclared stored field"),
        }
    }
    Ok(Record::new(id, properties))
}

/// Drives every future to completion concurrently.
///
/// Results keep input order. If any future fails, the first failure to
/// complete is returned once all of them have finished.
pub(crate) async fn fan_out<T, F>(futures: impl IntoIterator<Item = F>) -> EntityResult<Vec<T>>
where
    F: Future<Output = EntityResult<T>>,
{
    let mut pending: FuturesUnordered<_> = futures
        .into_iter()
        .enumerate()
        .map(|(index, fut)| async move { (index, fut.await) })
        .collect();

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(pending.len()).collect();
    let mut first_error = None;

    while let Some((index, result)) = pending.next().await {
        match result {
            Ok(value) => slots[index] = Some(value),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(slots.into_iter().flatten().collect()),
    }
}
