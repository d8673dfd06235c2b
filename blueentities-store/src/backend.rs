//! Backing-store abstraction.
//!
//! The mapper needs only field-hashes and ordered sets. Any key-value server
//! offering these primitives can back it; [`crate::MemoryStore`] is the
//! bundled in-process implementation.

use crate::error::BackendResult;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

/// Primitive operations issued against the backing store.
///
/// Each call is atomic on its own. Nothing here groups calls together; the
/// mapper's multi-step operations are sequences of independent calls.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Short name used in diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Sets one field of the hash at `key`, creating the hash if needed.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> BackendResult<()>;

    /// Returns every field of the hash at `key`, or `None` if absent.
    async fn hash_get_all(&self, key: &str) -> BackendResult<Option<HashMap<String, String>>>;

    /// Deletes `key` of any kind. Returns the number of keys removed.
    async fn delete(&self, key: &str) -> BackendResult<u64>;

    /// Adds `member` to the ordered set at `key`. Returns 1 if newly added.
    async fn sorted_set_add(&self, key: &str, member: &str, score: i64) -> BackendResult<u64>;

    /// Removes `member` from the ordered set. Returns the number removed.
    async fn sorted_set_remove(&self, key: &str, member: &str) -> BackendResult<u64>;

    /// Number of members in the ordered set; 0 if absent.
    async fn sorted_set_cardinality(&self, key: &str) -> BackendResult<u64>;

    /// Members ranked `start..=stop`, ordered by score then member bytes.
    ///
    /// Negative ranks count back from the last member (`-1` is the last).
    async fn sorted_set_range(&self, key: &str, start: i64, stop: i64)
        -> BackendResult<Vec<String>>;

    /// Whether `key` exists.
    async fn exists(&self, key: &str) -> BackendResult<bool>;

    /// Diagnostic information about the server.
    async fn info(&self) -> BackendResult<BTreeMap<String, String>>;

    /// Releases the connection. Later calls fail with `BackendError::Closed`.
    async fn close(&self) -> BackendResult<()>;
}
