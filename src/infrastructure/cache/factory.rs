//! Cache factory for runtime selection

use std::sync::Arc;

use tracing::info;

use crate::config::{CacheBackend, CacheSettings};
use crate::domain::{Cache, DomainError};

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::pool::{RedisPool, RedisPoolConfig};
use super::redis::{RedisCache, RedisCacheConfig};

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Redis => write!(f, "redis"),
            CacheBackend::InMemory => write!(f, "in_memory"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheBackend::InMemory),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: in_memory, redis",
                s
            ))),
        }
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a cache instance based on configuration.
    ///
    /// For Redis this also creates the process-wide connection pool; the
    /// returned cache owns it and closes it from `Cache::close`.
    pub fn create(settings: &CacheSettings) -> Result<Arc<dyn Cache>, DomainError> {
        info!(backend = %settings.backend, "Creating cache");

        match settings.backend {
            CacheBackend::InMemory => Ok(Arc::new(Self::create_in_memory(settings))),
            CacheBackend::Redis => Ok(Arc::new(Self::create_redis(settings)?)),
        }
    }

    pub fn create_in_memory(settings: &CacheSettings) -> InMemoryCache {
        InMemoryCache::with_config(
            InMemoryCacheConfig::default().with_max_capacity(settings.max_capacity),
        )
    }

    pub fn create_redis(settings: &CacheSettings) -> Result<RedisCache, DomainError> {
        let mut pool_config = RedisPoolConfig::new(settings.host.clone(), settings.port)
            .with_tls(settings.tls)
            .with_max_size(settings.pool_max_size)
            .with_connect_timeout(settings.connect_timeout())
            .with_wait_timeout(settings.wait_timeout());

        if let Some(password) = &settings.password {
            pool_config = pool_config.with_password(password.clone());
        }

        let pool = RedisPool::new(pool_config)?;

        let mut cache_config =
            RedisCacheConfig::default().with_operation_timeout(settings.operation_timeout());

        if let Some(prefix) = &settings.key_prefix {
            cache_config = cache_config.with_key_prefix(prefix.clone());
        }

        Ok(RedisCache::new(pool, cache_config))
    }
}
