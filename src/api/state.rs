//! Application state for shared services

use std::sync::Arc;

use tracing::info;

use crate::config::LookupConfig;
use crate::domain::{Cache, RecordStore};
use crate::infrastructure::services::{LookupService, LookupServiceConfig};

/// Shared handles injected into every handler.
///
/// Built once at startup. The cache and store handles are the same ones the
/// lookup service uses, so health checks and shutdown see the same pools.
#[derive(Clone)]
pub struct AppState {
    pub lookup_service: Arc<LookupService>,
    pub cache: Arc<dyn Cache>,
    pub store: Arc<dyn RecordStore>,
    pub lookup_config: Arc<LookupConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("lookup_service", &self.lookup_service)
            .field("lookup_config", &self.lookup_config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        cache: Arc<dyn Cache>,
        store: Arc<dyn RecordStore>,
        lookup_config: LookupConfig,
        service_config: LookupServiceConfig,
    ) -> Self {
        let lookup_service = Arc::new(LookupService::with_config(
            Arc::clone(&cache),
            Arc::clone(&store),
            service_config,
        ));

        Self {
            lookup_service,
            cache,
            store,
            lookup_config: Arc::new(lookup_config),
        }
    }

    /// Releases the cache pool and store connections
    pub async fn shutdown(&self) {
        self.cache.close().await;
        self.store.close().await;
        info!("Backend connections released");
    }
}
