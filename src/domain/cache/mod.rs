//! Cache domain - best-effort key-value cache abstraction

mod error;
mod repository;

pub use error::CacheError;
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::MockCache;
