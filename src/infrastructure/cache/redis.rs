//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::AsyncCommands;

use super::pool::RedisPool;
use crate::domain::{Cache, CacheError};

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Bound on a single GET or SET round trip
    pub operation_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: None,
            operation_timeout: Duration::from_secs(1),
        }
    }
}

impl RedisCacheConfig {
    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the per-operation timeout
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Redis cache backed by the shared connection pool.
///
/// Values are written with plain `SET` (no expiry). Every round trip is
/// bounded by the operation timeout and the connection is returned to the
/// pool when the call finishes, whatever the result.
#[derive(Clone)]
pub struct RedisCache {
    pool: RedisPool,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("pool", &self.pool)
            .finish()
    }
}

impl RedisCache {
    pub fn new(pool: RedisPool, config: RedisCacheConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &RedisPool {
        &self.pool
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, CacheError>
    where
        F: std::future::Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.operation_timeout, operation).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(self.config.operation_timeout)),
        }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.pool.get().await?;

        let value: Option<Vec<u8>> = self.bounded(conn.get(&prefixed_key)).await?;

        Ok(value.map(Bytes::from))
    }

    async fn set_raw(&self, key: &str, value: Bytes) -> Result<(), CacheError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.pool.get().await?;

        let _: () = self.bounded(conn.set(&prefixed_key, &value[..])).await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.pool.get().await?;

        let _: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close();
    }
}
