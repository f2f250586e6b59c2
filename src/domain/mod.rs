//! Domain layer - Core lookup types and dependency contracts

pub mod cache;
pub mod error;
pub mod record;
pub mod store;

pub use cache::{Cache, CacheError, CacheExt};
pub use error::DomainError;
pub use record::{LookupKey, LookupOutcome, Record, RecordOrigin};
pub use store::{RecordStore, StoreError};
