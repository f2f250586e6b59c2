//! Health check endpoints for Kubernetes probes

use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::state::AppState;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl HealthCheck {
    fn from_result<E: std::fmt::Display>(
        name: &str,
        result: Result<(), E>,
        failed: HealthStatus,
        started: Instant,
    ) -> Self {
        let (status, message) = match result {
            Ok(()) => (HealthStatus::Healthy, None),
            Err(e) => (failed, Some(e.to_string())),
        };

        Self {
            name: name.to_string(),
            status,
            message,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        }
    }
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check with dependency verification.
///
/// The store is required: if it cannot be reached the instance is not ready.
/// The cache is optional, so an unreachable cache only degrades the report.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let service_config = state.lookup_service.config();

    let (cache_check, store_check) = tokio::join!(
        check_cache(&state, service_config.cache_timeout),
        check_store(&state, service_config.store_timeout),
    );

    let checks = vec![cache_check, store_check];
    let overall_status = overall(&checks);

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - simple check to verify the service is running
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn overall(checks: &[HealthCheck]) -> HealthStatus {
    checks
        .iter()
        .map(|c| c.status)
        .fold(HealthStatus::Healthy, |acc, s| match (acc, s) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        })
}

async fn check_cache(state: &AppState, timeout: Duration) -> HealthCheck {
    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, state.cache.ping()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!("ping timed out after {:?}", timeout)),
    };

    HealthCheck::from_result("cache", result, HealthStatus::Degraded, start)
}

async fn check_store(state: &AppState, timeout: Duration) -> HealthCheck {
    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, state.store.ping()).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!("ping timed out after {:?}", timeout)),
    };

    HealthCheck::from_result("store", result, HealthStatus::Unhealthy, start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(status: HealthStatus) -> HealthCheck {
        HealthCheck {
            name: "x".to_string(),
            status,
            message: None,
            latency_ms: None,
        }
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_overall_status() {
        assert_eq!(
            overall(&[check(HealthStatus::Healthy), check(HealthStatus::Healthy)]),
            HealthStatus::Healthy
        );
        assert_eq!(
            overall(&[check(HealthStatus::Degraded), check(HealthStatus::Healthy)]),
            HealthStatus::Degraded
        );
        assert_eq!(
            overall(&[check(HealthStatus::Degraded), check(HealthStatus::Unhealthy)]),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_health_response_with_checks() {
        let response = HealthResponse {
            status: HealthStatus::Degraded,
            version: "1.0.0".to_string(),
            checks: Some(vec![
                HealthCheck::from_result::<String>(
                    "store",
                    Ok(()),
                    HealthStatus::Unhealthy,
                    Instant::now(),
                ),
                HealthCheck::from_result(
                    "cache",
                    Err("Connection refused"),
                    HealthStatus::Degraded,
                    Instant::now(),
                ),
            ]),
            latency_ms: Some(105),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"degraded\""));
        assert!(json.contains("\"store\""));
        assert!(json.contains("\"Connection refused\""));
    }
}
