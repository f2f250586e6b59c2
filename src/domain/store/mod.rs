//! Store domain - authoritative point lookups

mod error;
mod repository;

pub use error::StoreError;
pub use repository::RecordStore;

#[cfg(test)]
pub use repository::MockRecordStore;
