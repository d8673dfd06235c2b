use crate::error::{EntityError, EntityResult};
use serde::{Deserialize, Serialize};

/// Entities fetched per page by [`crate::EntityStore::iterate_all`].
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Server used when no connection URL is configured.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// How [`crate::RedisStore`] reaches its server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Connection string, e.g. `redis://:password@host:6379/2`.
    pub url: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
        }
    }
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Configuration for an entity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Prefix scoping every key, so several deployments can share a server.
    pub namespace: Option<String>,
    /// Page size used by full scans.
    pub page_size: usize,
    /// Server reached by [`crate::EntityStore::connect`].
    pub connection: ConnectionConfig,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            page_size: DEFAULT_PAGE_SIZE,
            connection: ConnectionConfig::default(),
        }
    }
}

impl MapperConfig {
    /// Configuration scoped to a namespace.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> EntityResult<()> {
        if self.page_size == 0 {
            return Err(EntityError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
