//! Record store trait definition

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::error::StoreError;
use crate::domain::record::{LookupKey, Record};

/// Authoritative, read-only access to the document store.
///
/// Implementations perform a single-record fetch using the key as both the
/// document id and the partition key. Any connection or session taken for a
/// read is released before the call returns, on every path.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads the record stored under `key`
    async fn read_by_key(&self, key: &LookupKey) -> Result<Record, StoreError>;

    /// Verifies the store is reachable
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Releases pooled resources. Called once at shutdown.
    async fn close(&self) {}
}
