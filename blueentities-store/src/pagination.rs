//! Rank-based reads over an entity's index set.
//!
//! Ranks are positions in the index at the moment a range is read. Writes
//! landing between two page reads shift later ranks, so a full scan racing
//! with inserts or removals can skip or repeat instances. Scans are exact
//! only while no concurrent writes touch the entity.

use crate::entity_store::{EntityStore, decode_record};
use crate::error::{EntityError, EntityResult};
use blueentities_model::codec;
use blueentities_model::{KeyCodec, Record, Value};
use blueentities_types::EntityId;
use futures::future::join_all;
use tracing::{debug, warn};

/// Fixed page layout for scanning `total` ranks.
///
/// Computed once from the cardinality seen at the start of a scan; it does
/// not follow later changes to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    total: u64,
    page_size: u64,
}

impl PagePlan {
    /// A page size of zero is treated as one.
    pub fn new(total: u64, page_size: usize) -> Self {
        Self {
            total,
            page_size: (page_size as u64).max(1),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(self.page_size)
    }

    /// Inclusive `(start, stop)` ranks of each page, in order.
    pub fn pages(&self) -> impl Iterator<Item = (i64, i64)> + use<> {
        let Self { total, page_size } = *self;
        (0..self.page_count()).map(move |page| {
            let start = page * page_size;
            let stop = (start + page_size).min(total) - 1;
            (start as i64, stop as i64)
        })
    }
}

impl EntityStore {
    /// Instances ranked `start..=stop` in the index, in rank order.
    ///
    /// Hashes are fetched concurrently and matched back to their index
    /// member by position, never by completion order. An index member whose
    /// hash is gone fails the whole call with `NotFound` for that id.
    pub async fn get_range(&self, entity: &str, start: i64, stop: i64) -> EntityResult<Vec<Record>> {
        let schema = self.registry.schema(entity)?;
        let members = self
            .backend
            .sorted_set_range(&self.keys.index_key(entity), start, stop)
            .await?;

        let fetched = join_all(members.iter().map(|key| self.backend.hash_get_all(key))).await;

        let mut records = Vec::with_capacity(members.len());
        for (key, fields) in members.iter().zip(fetched) {
            let id = member_id(entity, key)?;
            let Some(fields) = fields?.filter(|fields| !fields.is_empty()) else {
                warn!(entity, %id, "index entry without record");
                return Err(EntityError::not_found(entity, &id));
            };
            records.push(decode_record(schema, id, fields)?);
        }
        Ok(records)
    }

    /// Calls `visit` for every instance, one page at a time.
    ///
    /// Returns the number of instances visited. See the module docs for the
    /// behavior under concurrent writes.
    pub async fn iterate_all<F>(&self, entity: &str, mut visit: F) -> EntityResult<u64>
    where
        F: FnMut(Record),
    {
        let plan = PagePlan::new(self.get_count(entity).await?, self.config.page_size);
        debug!(entity, total = plan.total(), pages = plan.page_count(), "scanning entity");

        let mut visited = 0;
        for (start, stop) in plan.pages() {
            for record in self.get_range(entity, start, stop).await? {
                visit(record);
                visited += 1;
            }
        }
        Ok(visited)
    }

    /// Every instance whose `property` equals `value`.
    ///
    /// The property and the probe's type are checked before scanning. This is
    /// a full scan; there is no secondary index.
    pub async fn find_equal(
        &self,
        entity: &str,
        property: &str,
        value: &Value,
    ) -> EntityResult<Vec<Record>> {
        let def = self.registry.lookup(entity, property)?;
        codec::validate(entity, def, value)?;

        let mut matches = Vec::new();
        self.iterate_all(entity, |record| {
            if record.get(property) == Some(value) {
                matches.push(record);
            }
        })
        .await?;
        Ok(matches)
    }

    /// Drops index entries whose record hash no longer exists.
    ///
    /// Returns the ids that were unindexed. Recovers from a remove that
    /// deleted the hash but failed before updating the index.
    pub async fn repair_index(&self, entity: &str) -> EntityResult<Vec<EntityId>> {
        self.registry.schema(entity)?;
        let index_key = self.keys.index_key(entity);
        let members = self.backend.sorted_set_range(&index_key, 0, -1).await?;

        let present = join_all(members.iter().map(|key| self.backend.exists(key))).await;

        let mut repaired = Vec::new();
        for (key, exists) in members.iter().zip(present) {
            if exists? {
                continue;
            }
            self.backend.sorted_set_remove(&index_key, key).await?;
            let id = member_id(entity, key)?;
            warn!(entity, %id, "removed dangling index entry");
            repaired.push(id);
        }
        Ok(repaired)
    }
}

fn member_id(entity: &str, key: &str) -> EntityResult<EntityId> {
    let raw = KeyCodec::id_from_record_key(key);
    EntityId::parse(raw).map_err(|_| {
        EntityError::consistency(entity, raw, format!("index member '{key}' is not a record key"))
    })
}
