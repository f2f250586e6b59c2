//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheBackend, CachePopulation, CacheSettings, CosmosSettings, LogFormat,
    LoggingConfig, LookupConfig, PostgresSettings, ServerConfig, StoreBackend, StoreSettings,
};
