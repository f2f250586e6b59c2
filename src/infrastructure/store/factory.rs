//! Record store factory for runtime selection

use std::sync::Arc;

use tracing::info;

use crate::config::{StoreBackend, StoreSettings};
use crate::domain::{DomainError, RecordStore};

use super::cosmos::{CosmosConfig, CosmosRecordStore};
use super::in_memory::InMemoryRecordStore;
use super::postgres::{PostgresConfig, PostgresRecordStore};

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Cosmos => write!(f, "cosmos"),
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::InMemory => write!(f, "in_memory"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosmos" | "cosmosdb" => Ok(StoreBackend::Cosmos),
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "in_memory" | "inmemory" | "memory" => Ok(StoreBackend::InMemory),
            _ => Err(DomainError::configuration(format!(
                "Unknown store backend: {}. Valid backends: cosmos, postgres, in_memory",
                s
            ))),
        }
    }
}

/// Factory for creating record store instances
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    pub async fn create(settings: &StoreSettings) -> Result<Arc<dyn RecordStore>, DomainError> {
        info!(backend = %settings.backend, "Creating record store");

        match settings.backend {
            StoreBackend::Cosmos => {
                let cosmos = &settings.cosmos;
                if cosmos.key.is_empty() {
                    return Err(DomainError::configuration(
                        "store.cosmos.key is required for the cosmos backend",
                    ));
                }

                let config = CosmosConfig::new(
                    cosmos.endpoint.clone(),
                    cosmos.key.clone(),
                    cosmos.database.clone(),
                    cosmos.container.clone(),
                )
                .with_timeout(settings.timeout());

                Ok(Arc::new(CosmosRecordStore::new(config)?))
            }
            StoreBackend::Postgres => {
                let pg = &settings.postgres;
                let config = PostgresConfig::new(pg.url.clone(), pg.table.clone())
                    .with_max_connections(pg.max_connections)
                    .with_timeout(settings.timeout());

                Ok(Arc::new(PostgresRecordStore::connect_lazy(&config)?))
            }
            StoreBackend::InMemory => {
                let store = match &settings.seed_file {
                    Some(path) => InMemoryRecordStore::from_seed_file(path).await?,
                    None => InMemoryRecordStore::new(),
                };

                Ok(Arc::new(store))
            }
        }
    }
}
