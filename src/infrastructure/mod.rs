//! Infrastructure layer - Backend implementations and application services

pub mod cache;
pub mod logging;
pub mod observability;
pub mod services;
pub mod store;
