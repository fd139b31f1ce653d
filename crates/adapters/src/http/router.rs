use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Maximum request body size for API endpoints (64 KiB).
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Rate limit for write endpoints: 60 requests per 60 seconds per IP.
const WRITE_RATE_LIMIT_PER_SECOND: u64 = 1;
const WRITE_RATE_LIMIT_BURST: u32 = 60;

use super::alert_handler::{
    alert_overview, bulk_update_alert_status, create_alert, get_alert, list_alerts,
    update_alert_status,
};
use super::fraud_handler::{
    create_fraud_alert, device_fraud, fraud_overview, fraud_trends, geo_fraud, list_fraud_alerts,
    update_fraud_alert,
};
use super::health_handler::{healthz, readyz};
use super::metrics_handler::metrics;
use super::middleware::auth::owner_auth_middleware;
use super::openapi::ApiDoc;
use super::state::AppState;

/// Build the main Axum router with all REST API routes.
///
/// Routes are split into three groups:
/// 1. **Public** (no auth): `/healthz`, `/readyz` — probes
/// 2. **Metrics** (no auth): `/metrics`
/// 3. **API** (owner-scoped): `/api/v1/*` — every request resolves an
///    owner identity through the auth middleware
pub fn build_router(state: Arc<AppState>, swagger_ui: bool) -> Router {
    // Group 1: Public routes — never require auth (probes)
    let public_routes = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz));

    // Group 2: Metrics route
    let metrics_routes = Router::new().route("/metrics", get(metrics));

    // Group 3: Owner-scoped API routes — split into read and write
    //
    // Write routes get an additional per-IP rate limit (60 req/min).
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(WRITE_RATE_LIMIT_PER_SECOND)
            .burst_size(WRITE_RATE_LIMIT_BURST)
            .finish()
            .expect("governor config should build"),
    );

    let api_routes = {
        let read_routes = Router::new()
            .route("/api/v1/alerts", get(list_alerts))
            .route("/api/v1/alerts/overview", get(alert_overview))
            .route("/api/v1/alerts/{id}", get(get_alert))
            .route("/api/v1/fraud/overview", get(fraud_overview))
            .route("/api/v1/fraud/alerts", get(list_fraud_alerts))
            .route("/api/v1/fraud/trends", get(fraud_trends))
            .route("/api/v1/fraud/devices", get(device_fraud))
            .route("/api/v1/fraud/geo", get(geo_fraud));

        let write_routes = Router::new()
            .route("/api/v1/alerts", post(create_alert))
            .route("/api/v1/alerts/status", post(update_alert_status))
            .route("/api/v1/alerts/bulk-status", post(bulk_update_alert_status))
            .route("/api/v1/fraud/alerts", post(create_fraud_alert))
            .route("/api/v1/fraud/alerts/status", post(update_fraud_alert))
            .layer(GovernorLayer::new(governor_conf));

        read_routes
            .merge(write_routes)
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                owner_auth_middleware,
            ))
    };

    let router = public_routes.merge(metrics_routes).merge(api_routes);

    let router = if swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use application::alert_service_impl::AlertAppService;
    use infrastructure::metrics::ServerMetrics;
    use ports::test_utils::{
        MemoryAlertStore, NoopBidStats, NoopMetrics, StaticCampaignDirectory,
    };

    #[test]
    fn build_router_does_not_panic() {
        let service = Arc::new(AlertAppService::new(
            Arc::new(MemoryAlertStore::new()),
            Arc::new(StaticCampaignDirectory::new()),
            Arc::new(NoopBidStats),
            Arc::new(NoopMetrics),
        ));
        let state = Arc::new(AppState::new(service, Arc::new(ServerMetrics::new())));
        let _router = build_router(state, true);
    }
}
