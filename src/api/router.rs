use axum::{
    http::HeaderName,
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::{request_id::PropagateRequestIdLayer, trace::TraceLayer};
use tracing::warn;

use super::health;
use super::lookup;
use super::middleware::{logging_middleware, metrics_middleware, security_headers_middleware};
use super::state::AppState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

const DEFAULT_INVOCATION_HEADER: &str = "x-invocation-id";

fn invocation_header(name: &str) -> HeaderName {
    HeaderName::try_from(name.to_ascii_lowercase()).unwrap_or_else(|e| {
        warn!(header = %name, error = %e, "Invalid invocation id header, using default");
        HeaderName::from_static(DEFAULT_INVOCATION_HEADER)
    })
}

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let invocation_header = invocation_header(&state.lookup_config.invocation_id_header);
    let route = state.lookup_config.route.clone();

    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Lookup endpoint answers every verb so unsupported ones get a JSON 405
        .route(&route, any(lookup::lookup_handler))
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn_with_state(
            invocation_header.clone(),
            logging_middleware,
        ))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(PropagateRequestIdLayer::new(invocation_header))
        .layer(TraceLayer::new_for_http())
}

/// Full router plus the Prometheus endpoint when metrics are enabled
pub fn create_router_with_metrics(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    let router = create_router(state);

    match metrics {
        Some(m) => router.merge(create_metrics_router(m, metrics_path)),
        None => router,
    }
}
