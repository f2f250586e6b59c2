//! Application services

mod lookup_service;

pub use lookup_service::{LookupService, LookupServiceConfig};
