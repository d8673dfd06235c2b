//! In-process backing store.
//!
//! Keeps field-hashes and ordered sets in a shared keyspace behind a tokio
//! `RwLock`. Ordered sets rank members by `(score, member)` so equal scores
//! fall back to byte-wise member order, the tie-break rule pagination
//! depends on.

use crate::backend::BackingStore;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<String, i64>,
    ranked: BTreeSet<(i64, String)>,
}

impl SortedSet {
    fn insert(&mut self, member: &str, score: i64) -> u64 {
        match self.scores.insert(member.to_string(), score) {
            Some(old) => {
                self.ranked.remove(&(old, member.to_string()));
                self.ranked.insert((score, member.to_string()));
                0
            }
            None => {
                self.ranked.insert((score, member.to_string()));
                1
            }
        }
    }

    fn remove(&mut self, member: &str) -> u64 {
        match self.scores.remove(member) {
            Some(score) => {
                self.ranked.remove(&(score, member.to_string()));
                1
            }
            None => 0,
        }
    }

    fn len(&self) -> usize {
        self.scores.len()
    }

    fn range(&self, start: i64, stop: i64) -> Vec<String> {
        let len = self.len() as i64;
        let start = if start < 0 { (start + len).max(0) } else { start };
        let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };
        if start > stop || start >= len {
            return Vec::new();
        }

        self.ranked
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .map(|(_, member)| member.clone())
            .collect()
    }
}

#[derive(Debug)]
enum Slot {
    Hash(HashMap<String, String>),
    Set(SortedSet),
}

#[derive(Debug, Default)]
struct Inner {
    keyspace: RwLock<HashMap<String, Slot>>,
    closed: AtomicBool,
    commands: AtomicU64,
}

/// Shared in-memory keyspace.
///
/// Clones share the same data, so one store can be handed to several
/// mappers the way a single server connection would be.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn begin(&self) -> BackendResult<()> {
        self.ensure_open()?;
        self.inner.commands.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Checked again once the keyspace lock is held, so a command queued
    /// behind the lock when `close` runs fails instead of completing.
    fn ensure_open(&self) -> BackendResult<()> {
        if self.is_closed() {
            return Err(BackendError::Closed);
        }
        Ok(())
    }
}

fn wrong_type(key: &str) -> BackendError {
    BackendError::WrongType {
        key: key.to_string(),
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> BackendResult<()> {
        self.begin()?;
        let mut keyspace = self.inner.keyspace.write().await;
        self.ensure_open()?;
        let slot = keyspace
            .entry(key.to_string())
            .or_insert_with(|| Slot::Hash(HashMap::new()));
        match slot {
            Slot::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            Slot::Set(_) => Err(wrong_type(key)),
        }
    }

    async fn hash_get_all(&self, key: &str) -> BackendResult<Option<HashMap<String, String>>> {
        self.begin()?;
        let keyspace = self.inner.keyspace.read().await;
        self.ensure_open()?;
        match keyspace.get(key) {
            Some(Slot::Hash(fields)) => Ok(Some(fields.clone())),
            Some(Slot::Set(_)) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> BackendResult<u64> {
        self.begin()?;
        let mut keyspace = self.inner.keyspace.write().await;
        self.ensure_open()?;
        Ok(u64::from(keyspace.remove(key).is_some()))
    }

    async fn sorted_set_add(&self, key: &str, member: &str, score: i64) -> BackendResult<u64> {
        self.begin()?;
        let mut keyspace = self.inner.keyspace.write().await;
        self.ensure_open()?;
        let slot = keyspace
            .entry(key.to_string())
            .or_insert_with(|| Slot::Set(SortedSet::default()));
        match slot {
            Slot::Set(set) => Ok(set.insert(member, score)),
            Slot::Hash(_) => Err(wrong_type(key)),
        }
    }

    async fn sorted_set_remove(&self, key: &str, member: &str) -> BackendResult<u64> {
        self.begin()?;
        let mut keyspace = self.inner.keyspace.write().await;
        self.ensure_open()?;
        let (removed, now_empty) = match keyspace.get_mut(key) {
            Some(Slot::Set(set)) => {
                let removed = set.remove(member);
                (removed, set.len() == 0)
            }
            Some(Slot::Hash(_)) => return Err(wrong_type(key)),
            None => return Ok(0),
        };
        // Empty sets do not exist as keys.
        if now_empty {
            keyspace.remove(key);
        }
        Ok(removed)
    }

    async fn sorted_set_cardinality(&self, key: &str) -> BackendResult<u64> {
        self.begin()?;
        let keyspace = self.inner.keyspace.read().await;
        self.ensure_open()?;
        match keyspace.get(key) {
            Some(Slot::Set(set)) => Ok(set.len() as u64),
            Some(Slot::Hash(_)) => Err(wrong_type(key)),
            None => Ok(0),
        }
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> BackendResult<Vec<String>> {
        self.begin()?;
        let keyspace = self.inner.keyspace.read().await;
        self.ensure_open()?;
        match keyspace.get(key) {
            Some(Slot::Set(set)) => Ok(set.range(start, stop)),
            Some(Slot::Hash(_)) => Err(wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        self.begin()?;
        let keyspace = self.inner.keyspace.read().await;
        self.ensure_open()?;
        Ok(keyspace.contains_key(key))
    }

    async fn info(&self) -> BackendResult<BTreeMap<String, String>> {
        self.begin()?;
        let keyspace = self.inner.keyspace.read().await;
        self.ensure_open()?;
        let hashes = keyspace
            .values()
            .filter(|slot| matches!(slot, Slot::Hash(_)))
            .count();

        let mut info = BTreeMap::new();
        info.insert("backend".to_string(), self.backend_name().to_string());
        info.insert("keys".to_string(), keyspace.len().to_string());
        info.insert("hashes".to_string(), hashes.to_string());
        info.insert(
            "sorted_sets".to_string(),
            (keyspace.len() - hashes).to_string(),
        );
        info.insert(
            "commands_processed".to_string(),
            self.inner.commands.load(Ordering::Relaxed).to_string(),
        );
        Ok(info)
    }

    async fn close(&self) -> BackendResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Err(BackendError::Closed);
        }
        debug!("memory store closed");
        Ok(())
    }
}
