//! Record Lookup Gateway
//!
//! Read-through cached point lookups over a document store:
//! - Redis (pooled) or in-memory cache in front of the store
//! - Cosmos DB, PostgreSQL or in-memory record stores
//! - Cache faults degrade latency, never availability

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use api::state::AppState;
use infrastructure::cache::CacheFactory;
use infrastructure::services::LookupServiceConfig;
use infrastructure::store::StoreFactory;
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration.
///
/// Builds the process-wide cache pool and store client once; every request
/// shares them through the returned state.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    if !config.lookup.route.starts_with('/') {
        anyhow::bail!(
            "lookup.route must start with '/', got {:?}",
            config.lookup.route
        );
    }

    let cache = CacheFactory::create(&config.cache)?;
    let store = StoreFactory::create(&config.store).await?;

    let service_config =
        LookupServiceConfig::from_settings(&config.lookup, &config.cache, &config.store);

    info!(
        cache = %config.cache.backend,
        store = %config.store.backend,
        route = %config.lookup.route,
        "Application state created"
    );

    Ok(AppState::new(
        cache,
        store,
        config.lookup.clone(),
        service_config,
    ))
}
