//! In-memory cache implementation using moka

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache as MokaCache;

use crate::domain::{Cache, CacheError};

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries before size-based eviction kicks in
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
        }
    }
}

impl InMemoryCacheConfig {
    /// Creates a new configuration with specified max capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// Process-local cache for development and single-instance deployments.
///
/// Entries carry no TTL; they live until overwritten or evicted when the
/// capacity bound is reached.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, Bytes>,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self {
            cache: MokaCache::builder()
                .max_capacity(config.max_capacity)
                .build(),
        }
    }

    /// Approximate number of entries
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(self.cache.get(key).await)
    }

    async fn set_raw(&self, key: &str, value: Bytes) -> Result<(), CacheError> {
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }
}
