//! Observability infrastructure - Tracing and Metrics

mod config;
mod metrics;
mod tracing_setup;

pub use config::{MetricsConfig, ObservabilityConfig, TracingConfig};
pub use metrics::{
    create_metrics_router, init_metrics, record_cache_hit, record_cache_miss,
    record_http_request, record_lookup, record_store_error, PrometheusMetrics,
};
pub use tracing_setup::{init_tracing, shutdown_tracing};
