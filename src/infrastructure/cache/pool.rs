//! Redis connection pool shared by every request in the process

use std::fmt;
use std::time::Duration;

use deadpool::managed::TimeoutType;
use deadpool_redis::{Config, Connection, Pool, PoolConfig, PoolError, Runtime, Timeouts};
use tracing::info;

use crate::domain::{CacheError, DomainError};

/// Configuration for the Redis connection pool
#[derive(Clone)]
pub struct RedisPoolConfig {
    /// Redis host name
    pub host: String,
    /// Redis port (6380 for TLS on most managed offerings)
    pub port: u16,
    /// Access key / password
    pub password: Option<String>,
    /// Connect over TLS (`rediss://`)
    pub tls: bool,
    /// Upper bound on simultaneously open connections
    pub max_size: usize,
    /// Bound on establishing a new connection
    pub connect_timeout: Duration,
    /// Bound on waiting for a free connection when the pool is exhausted
    pub wait_timeout: Duration,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            tls: false,
            max_size: 16,
            connect_timeout: Duration::from_secs(1),
            wait_timeout: Duration::from_secs(1),
        }
    }
}

impl fmt::Debug for RedisPoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisPoolConfig")
            .field("url", &self.redacted_url())
            .field("max_size", &self.max_size)
            .field("connect_timeout", &self.connect_timeout)
            .field("wait_timeout", &self.wait_timeout)
            .finish()
    }
}

impl RedisPoolConfig {
    /// Creates a new configuration for the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    fn scheme(&self) -> &'static str {
        if self.tls { "rediss" } else { "redis" }
    }

    /// Connection URL including credentials
    pub fn connection_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "{}://:{}@{}:{}",
                self.scheme(),
                urlencoding::encode(password),
                self.host,
                self.port
            ),
            None => format!("{}://{}:{}", self.scheme(), self.host, self.port),
        }
    }

    /// Connection URL safe for logs
    pub fn redacted_url(&self) -> String {
        match &self.password {
            Some(_) => format!("{}://:***@{}:{}", self.scheme(), self.host, self.port),
            None => self.connection_url(),
        }
    }
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub max_size: usize,
    pub size: usize,
    pub available: usize,
    pub waiting: usize,
}

/// Bounded, process-wide pool of Redis connections.
///
/// Created once at startup and cloned into every component that talks to the
/// cache; clones share the same underlying pool. When all connections are in
/// use, `get` waits up to the configured wait timeout and then fails instead
/// of opening more connections. `close` is called once at shutdown.
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
    config: RedisPoolConfig,
}

impl fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisPool")
            .field("config", &self.config)
            .field("status", &self.status())
            .finish()
    }
}

impl RedisPool {
    /// Builds the pool. Connections are opened lazily on first use.
    pub fn new(config: RedisPoolConfig) -> Result<Self, DomainError> {
        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(config.wait_timeout);
        timeouts.create = Some(config.connect_timeout);
        timeouts.recycle = Some(config.connect_timeout);

        let mut pool_config = PoolConfig::new(config.max_size);
        pool_config.timeouts = timeouts;

        let mut deadpool_config = Config::from_url(config.connection_url());
        deadpool_config.pool = Some(pool_config);

        let pool = deadpool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DomainError::cache(format!("Failed to create Redis pool: {}", e)))?;

        info!(
            url = %config.redacted_url(),
            max_size = config.max_size,
            "Redis connection pool created"
        );

        Ok(Self { pool, config })
    }

    /// Checks out a connection; it returns to the pool when dropped
    pub async fn get(&self) -> Result<Connection, CacheError> {
        self.pool.get().await.map_err(map_pool_error)
    }

    pub fn status(&self) -> PoolStatus {
        let status = self.pool.status();

        PoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    pub fn config(&self) -> &RedisPoolConfig {
        &self.config
    }

    /// Closes the pool and drops idle connections
    pub fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close();
            info!(url = %self.config.redacted_url(), "Redis connection pool closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

fn map_pool_error(err: PoolError) -> CacheError {
    match err {
        PoolError::Timeout(TimeoutType::Wait) => {
            CacheError::PoolExhausted("timed out waiting for a free connection".to_string())
        }
        PoolError::Timeout(TimeoutType::Create) => {
            CacheError::Connection("timed out opening a connection".to_string())
        }
        PoolError::Timeout(TimeoutType::Recycle) => {
            CacheError::Connection("timed out recycling a connection".to_string())
        }
        PoolError::Backend(e) => CacheError::from(e),
        PoolError::Closed => CacheError::PoolClosed,
        other => CacheError::connection(other.to_string()),
    }
}
