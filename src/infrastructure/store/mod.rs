//! Document store backends

mod cosmos;
mod factory;
mod in_memory;
mod postgres;

pub use cosmos::{CosmosConfig, CosmosRecordStore};
pub use factory::StoreFactory;
pub use in_memory::InMemoryRecordStore;
pub use postgres::{PostgresConfig, PostgresRecordStore};
