use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use super::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

/// `GET /healthz` — liveness probe.
#[utoipa::path(
    get, path = "/healthz",
    tag = "Health",
    responses((status = 200, description = "Process is alive", body = HealthResponse))
)]
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /readyz` — readiness probe with version and uptime.
#[utoipa::path(
    get, path = "/readyz",
    tag = "Health",
    responses((status = 200, description = "Server is serving requests", body = ReadyResponse))
)]
pub async fn readyz(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ready",
        version: state.version,
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let json = serde_json::to_value(HealthResponse { status: "ok" }).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[test]
    fn ready_response_serializes() {
        let json = serde_json::to_value(ReadyResponse {
            status: "ready",
            version: "0.4.0",
            uptime_secs: 12,
        })
        .unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["uptime_secs"], 12);
    }
}
