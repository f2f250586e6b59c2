use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::observability::ObservabilityConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub observability: ObservabilityConfig,
    pub lookup: LookupConfig,
    pub cache: CacheSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// When the post-store-hit cache write runs relative to the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CachePopulation {
    /// Awaited (bounded by the cache timeout) before the response is returned
    #[default]
    Inline,
    /// Spawned onto the runtime; the response does not wait for it
    Background,
}

/// Lookup endpoint and orchestration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Route serving lookups
    pub route: String,
    /// Query parameter carrying the key
    pub key_param: String,
    /// Query parameter that turns a request into a liveness probe
    pub heartbeat_param: String,
    /// Name reported by heartbeat responses
    pub service_name: String,
    /// Request header echoed back on every response when present
    pub invocation_id_header: String,
    /// Report store faults as 503 instead of collapsing them into 404
    pub distinguish_store_unavailable: bool,
    pub cache_population: CachePopulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Redis,
    #[serde(alias = "memory", alias = "inmemory")]
    InMemory,
}

/// Cache connection settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub tls: bool,
    pub key_prefix: Option<String>,
    pub pool_max_size: usize,
    pub connect_timeout_ms: u64,
    pub operation_timeout_ms: u64,
    pub wait_timeout_ms: u64,
    /// Entry bound for the in-memory backend
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Cosmos,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    #[serde(alias = "memory", alias = "inmemory")]
    InMemory,
}

/// Document store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub timeout_ms: u64,
    pub cosmos: CosmosSettings,
    pub postgres: PostgresSettings,
    /// JSON object of `key -> record` loaded into the in-memory backend
    pub seed_file: Option<PathBuf>,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CosmosSettings {
    pub endpoint: String,
    pub key: String,
    pub database: String,
    pub container: String,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct PostgresSettings {
    pub url: String,
    pub table: String,
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            route: "/api/details".to_string(),
            key_param: "lookup".to_string(),
            heartbeat_param: "heartbeat".to_string(),
            service_name: "GetDetails".to_string(),
            invocation_id_header: "x-invocation-id".to_string(),
            distinguish_store_unavailable: false,
            cache_population: CachePopulation::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            tls: false,
            key_prefix: None,
            pool_max_size: 16,
            connect_timeout_ms: 1000,
            operation_timeout_ms: 1000,
            wait_timeout_ms: 1000,
            max_capacity: 10_000,
        }
    }
}

impl CacheSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

impl fmt::Debug for CacheSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSettings")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("tls", &self.tls)
            .field("key_prefix", &self.key_prefix)
            .field("pool_max_size", &self.pool_max_size)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .field("wait_timeout_ms", &self.wait_timeout_ms)
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            timeout_ms: 5000,
            cosmos: CosmosSettings::default(),
            postgres: PostgresSettings::default(),
            seed_file: None,
        }
    }
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CosmosSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://localhost:8081".to_string(),
            key: String::new(),
            database: "VolcanoData".to_string(),
            container: "Details".to_string(),
        }
    }
}

impl fmt::Debug for CosmosSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosmosSettings")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("database", &self.database)
            .field("container", &self.container)
            .finish()
    }
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/records".to_string(),
            table: "records".to_string(),
            max_connections: 10,
        }
    }
}

impl fmt::Debug for PostgresSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("url", &"[REDACTED]")
            .field("table", &self.table)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
