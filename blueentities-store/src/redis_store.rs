//! Redis backing store.
//!
//! Issues one Redis command per primitive through a multiplexed
//! [`ConnectionManager`], which reconnects on its own after transient
//! failures. Every clone of the manager shares the same connection.

use crate::backend::BackingStore;
use crate::config::ConnectionConfig;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, RedisResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Backing store talking to a Redis server.
pub struct RedisStore {
    conn: RwLock<Option<ConnectionManager>>,
    closed: AtomicBool,
}

impl RedisStore {
    /// Opens a connection to the configured server.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unavailable` if the URL is malformed or the
    /// server cannot be reached.
    pub async fn connect(config: &ConnectionConfig) -> BackendResult<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| unavailable("invalid connection url", e))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| unavailable("failed to connect", e))?;

        info!(addr = %client_addr(&config.url), "connected to redis");
        Ok(Self {
            conn: RwLock::new(Some(manager)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn connection(&self) -> BackendResult<ConnectionManager> {
        if self.is_closed() {
            return Err(BackendError::Closed);
        }
        self.conn.read().await.clone().ok_or(BackendError::Closed)
    }

    /// Replies arriving after `close` are discarded.
    fn finish<T>(&self, key: &str, reply: RedisResult<T>) -> BackendResult<T> {
        if self.is_closed() {
            return Err(BackendError::Closed);
        }
        reply.map_err(|e| command_error(key, e))
    }
}

fn unavailable(context: &str, err: RedisError) -> BackendError {
    BackendError::Unavailable(format!("{context}: {err}"))
}

fn command_error(key: &str, err: RedisError) -> BackendError {
    if err.code() == Some("WRONGTYPE") {
        BackendError::WrongType {
            key: key.to_string(),
        }
    } else {
        BackendError::Unavailable(err.to_string())
    }
}

/// Host part of a connection URL, without credentials.
fn client_addr(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.rsplit_once('@').map_or(rest, |(_, host)| host)
}

/// Parses the `field:value` lines of an INFO reply. Section headers and
/// blank lines are skipped.
fn parse_info(raw: &str) -> BTreeMap<String, String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect()
}

#[async_trait]
impl BackingStore for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> BackendResult<()> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<()> = conn.hset(key, field, value).await;
        self.finish(key, reply)
    }

    async fn hash_get_all(&self, key: &str) -> BackendResult<Option<HashMap<String, String>>> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<HashMap<String, String>> = conn.hgetall(key).await;
        // Redis reports a missing hash as an empty one.
        let fields = self.finish(key, reply)?;
        Ok((!fields.is_empty()).then_some(fields))
    }

    async fn delete(&self, key: &str) -> BackendResult<u64> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<u64> = conn.del(key).await;
        self.finish(key, reply)
    }

    async fn sorted_set_add(&self, key: &str, member: &str, score: i64) -> BackendResult<u64> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<u64> = conn.zadd(key, member, score).await;
        self.finish(key, reply)
    }

    async fn sorted_set_remove(&self, key: &str, member: &str) -> BackendResult<u64> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<u64> = conn.zrem(key, member).await;
        self.finish(key, reply)
    }

    async fn sorted_set_cardinality(&self, key: &str) -> BackendResult<u64> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<u64> = conn.zcard(key).await;
        self.finish(key, reply)
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> BackendResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<Vec<String>> =
            conn.zrange(key, start as isize, stop as isize).await;
        self.finish(key, reply)
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<bool> = conn.exists(key).await;
        self.finish(key, reply)
    }

    async fn info(&self) -> BackendResult<BTreeMap<String, String>> {
        let mut conn = self.connection().await?;
        let reply: RedisResult<String> = redis::cmd("INFO").query_async(&mut conn).await;
        let mut info = parse_info(&self.finish("", reply)?);
        info.insert("backend".to_string(), self.backend_name().to_string());
        Ok(info)
    }

    async fn close(&self) -> BackendResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(BackendError::Closed);
        }
        // Clones held by in-flight commands keep the connection alive until
        // they finish; their replies are discarded by `finish`.
        self.conn.write().await.take();
        debug!("redis store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_reply_is_flattened() {
        let raw = "# Server\r\nredis_version:7.2.4\r\nos:Linux x86_64\r\n\r\n# Keyspace\r\ndb0:keys=3,expires=0\r\n";
        let info = parse_info(raw);
        assert_eq!(info["redis_version"], "7.2.4");
        assert_eq!(info["os"], "Linux x86_64");
        assert_eq!(info["db0"], "keys=3,expires=0");
        assert_eq!(info.len(), 3);
    }

    #[test]
    fn io_errors_map_to_unavailable() {
        let err = RedisError::from((redis::ErrorKind::IoError, "connection reset"));
        assert!(matches!(
            command_error("k", err),
            BackendError::Unavailable(_)
        ));
    }

    #[test]
    fn addr_hides_credentials() {
        assert_eq!(client_addr("redis://:secret@cache:6379/2"), "cache:6379/2");
        assert_eq!(client_addr("redis://127.0.0.1:6379"), "127.0.0.1:6379");
    }
}
