use utoipa::OpenApi;

use super::alert_handler;
use super::fraud_handler;
use super::health_handler;
use super::metrics_handler;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "bidwatch API",
        description = "Bid-analytics alert and fraud-signal lifecycle API"
    ),
    paths(
        health_handler::healthz,
        health_handler::readyz,
        metrics_handler::metrics,
        alert_handler::list_alerts,
        alert_handler::get_alert,
        alert_handler::create_alert,
        alert_handler::alert_overview,
        alert_handler::update_alert_status,
        alert_handler::bulk_update_alert_status,
        fraud_handler::fraud_overview,
        fraud_handler::list_fraud_alerts,
        fraud_handler::create_fraud_alert,
        fraud_handler::update_fraud_alert,
        fraud_handler::fraud_trends,
        fraud_handler::device_fraud,
        fraud_handler::geo_fraud,
    ),
    components(schemas(
        alert_handler::AlertResponse,
        alert_handler::AlertListResponse,
        alert_handler::AlertOverviewResponse,
        alert_handler::TrendBucket,
        alert_handler::CreateAlertRequest,
        alert_handler::CreateAlertResponse,
        alert_handler::UpdateStatusRequest,
        alert_handler::BulkUpdateRequest,
        alert_handler::BulkUpdateResponse,
        fraud_handler::FraudAlertResponse,
        fraud_handler::FraudOverviewResponse,
        fraud_handler::CampaignRiskResponse,
        fraud_handler::CreateFraudAlertRequest,
        fraud_handler::CreateFraudAlertResponse,
        fraud_handler::UpdateFraudAlertRequest,
        fraud_handler::FraudTrendResponse,
        fraud_handler::DeviceFraudResponse,
        fraud_handler::GeoFraudResponse,
        health_handler::HealthResponse,
        health_handler::ReadyResponse,
        super::error::ErrorBody,
    )),
    tags(
        (name = "Alerts", description = "Dashboard alert lifecycle"),
        (name = "Fraud", description = "Fraud-signal lifecycle and analytics"),
        (name = "Health", description = "Probes and metrics"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/api/v1/alerts"));
        assert!(json.contains("/api/v1/fraud/trends"));
    }
}
