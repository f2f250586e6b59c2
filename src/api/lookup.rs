//! Record lookup endpoint

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::state::AppState;
use super::types::MessageResponse;
use crate::domain::LookupOutcome;

/// Handles every verb on the lookup route.
///
/// Non-GET requests are rejected before anything else, then a non-empty
/// heartbeat parameter answers without touching the cache or the store.
pub async fn lookup_handler(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if method != Method::GET {
        return outcome_response(LookupOutcome::UnsupportedOperation);
    }

    let config = &state.lookup_config;

    if params
        .get(&config.heartbeat_param)
        .is_some_and(|v| !v.is_empty())
    {
        debug!("Heartbeat request");
        return (
            StatusCode::OK,
            Json(MessageResponse::alive(&config.service_name)),
        )
            .into_response();
    }

    let key = params.get(&config.key_param).map(String::as_str);
    let outcome = state.lookup_service.lookup(key).await;

    outcome_response(outcome)
}

/// Maps an outcome to its HTTP response
pub fn outcome_response(outcome: LookupOutcome) -> Response {
    let status =
        StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match outcome {
        LookupOutcome::Found { payload, .. } => (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            payload,
        )
            .into_response(),
        other => (status, Json(MessageResponse::new(other.message()))).into_response(),
    }
}
