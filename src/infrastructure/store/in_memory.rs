//! In-memory record store for development and testing

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::info;

use crate::domain::{DomainError, LookupKey, Record, RecordStore, StoreError};

/// Record store backed by a map, optionally seeded from a JSON file
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, Record>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records<I, K>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, Record)>,
        K: Into<String>,
    {
        Self {
            records: RwLock::new(records.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Loads a JSON object whose members are `key -> record`
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to read seed file {}: {}",
                path.display(),
                e
            ))
        })?;

        let records: HashMap<String, Record> = serde_json::from_str(&contents).map_err(|e| {
            DomainError::configuration(format!(
                "Seed file {} must be a JSON object of records: {}",
                path.display(),
                e
            ))
        })?;

        info!(path = %path.display(), count = records.len(), "Loaded seed records");

        Ok(Self::with_records(records))
    }

    pub fn insert(&self, key: impl Into<String>, record: Record) -> Result<(), DomainError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| DomainError::internal(format!("Lock poisoned: {}", e)))?;
        records.insert(key.into(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn read_by_key(&self, key: &LookupKey) -> Result<Record, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::unavailable(format!("Lock poisoned: {}", e)))?;

        records
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| StoreError::not_found(key.as_str()))
    }
}
