use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use super::error::ApiError;
use super::state::AppState;

/// OpenMetrics content type emitted by prometheus-client.
const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// `GET /metrics` — Prometheus text exposition.
#[utoipa::path(
    get, path = "/metrics",
    tag = "Health",
    responses((status = 200, description = "Prometheus metrics", body = String))
)]
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.encode().map_err(|e| ApiError::Internal {
        message: format!("metrics encoding failed: {e}"),
    })?;
    Ok(([(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body))
}
