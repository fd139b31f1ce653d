use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use application::alert_service_impl::{FraudListRequest, NewFraudAlert, StatusUpdate};
use domain::alert::aggregate::{CampaignRisk, DeviceFraudRow, GeoFraudRow, TrendPoint};
use domain::alert::entity::Alert;
use domain::common::entity::{CampaignId, OwnerId};

use super::alert_handler::WindowParams;
use super::error::{ApiError, ErrorBody};
use super::state::AppState;

// ── Query parameter DTOs ────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
pub struct FraudAlertQueryParams {
    /// Filter by status ("active", "investigating", "resolved",
    /// "false_positive").
    pub status: Option<String>,
    /// Minimum severity score (1-10).
    pub min_severity: Option<u8>,
    /// Filter by detector label (e.g. "click_velocity").
    pub alert_type: Option<String>,
    /// Detection-date lower bound, `YYYY-MM-DD`. Malformed values drop
    /// the predicate.
    pub start_date: Option<String>,
    /// Detection-date upper bound (inclusive of the named day).
    pub end_date: Option<String>,
    /// Maximum entries to return (default 100, max 1000).
    pub limit: Option<usize>,
}

// ── Request/response DTOs ───────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFraudAlertRequest {
    /// Campaign the detection belongs to (UUID).
    pub campaign_id: String,
    /// Detector label (e.g. "click_velocity", "ip_anomaly").
    pub alert_type: String,
    /// Severity score, 1-10.
    pub severity: u8,
    pub description: String,
    /// Affected user/device identifiers.
    #[serde(default)]
    pub affected_user_ids: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateFraudAlertResponse {
    pub alert_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFraudAlertRequest {
    pub alert_id: String,
    /// Target status ("active", "investigating", "resolved",
    /// "false_positive").
    pub status: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct FraudAlertResponse {
    pub id: String,
    pub campaign_id: String,
    pub alert_type: String,
    /// Severity score on the 1-10 scale.
    pub severity: u8,
    pub description: String,
    pub affected_user_ids: Vec<String>,
    pub detected_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub version: u64,
}

impl From<Alert> for FraudAlertResponse {
    fn from(alert: Alert) -> Self {
        Self {
            id: alert.id.to_string(),
            campaign_id: alert.campaign.map(|c| c.to_string()).unwrap_or_default(),
            alert_type: alert.type_label().to_string(),
            severity: alert.severity.rank(),
            description: alert.message,
            affected_user_ids: alert.affected_entities,
            detected_at: alert.created_at,
            resolved_at: alert.resolved_at,
            status: alert.status.as_str().to_string(),
            notes: alert.notes,
            version: alert.version,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CampaignRiskResponse {
    pub campaign_id: String,
    pub campaign_name: String,
    pub fraud_attempts: u64,
    pub risk_score: f64,
    pub threat_level: String,
}

impl From<CampaignRisk> for CampaignRiskResponse {
    fn from(risk: CampaignRisk) -> Self {
        Self {
            campaign_id: risk.campaign.to_string(),
            campaign_name: risk.campaign_name,
            fraud_attempts: risk.fraud_attempts,
            risk_score: risk.risk_score,
            threat_level: risk.threat_level.as_str().to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FraudOverviewResponse {
    pub window_days: i64,
    pub total_alerts: u64,
    pub active_alerts: u64,
    /// Fraud-flagged bids in the window (bid-evaluation store).
    pub blocked_bids: u64,
    /// Sum of bid prices on fraud-flagged bids.
    pub amount_saved: f64,
    /// Overall threat level derived from the active-alert count.
    pub threat_level: String,
    pub alerts_by_type: BTreeMap<String, u64>,
    pub top_affected_campaigns: Vec<CampaignRiskResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct FraudTrendResponse {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub fraud_attempts: u64,
    pub blocked_bids: u64,
    pub amount_saved: f64,
}

impl From<TrendPoint> for FraudTrendResponse {
    fn from(point: TrendPoint) -> Self {
        Self {
            date: point.date.format("%Y-%m-%d").to_string(),
            fraud_attempts: point.detections,
            blocked_bids: point.blocked_bids,
            amount_saved: point.amount_saved,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DeviceFraudResponse {
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub total_bids: u64,
    pub fraud_bids: u64,
    pub fraud_rate: f64,
}

impl From<DeviceFraudRow> for DeviceFraudResponse {
    fn from(row: DeviceFraudRow) -> Self {
        Self {
            device_type: row.device_type,
            browser: row.browser,
            os: row.os,
            total_bids: row.total_bids,
            fraud_bids: row.fraud_bids,
            fraud_rate: row.fraud_rate,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GeoFraudResponse {
    pub country: String,
    pub region: String,
    pub city: String,
    pub total_bids: u64,
    pub fraud_bids: u64,
    pub fraud_rate: f64,
}

impl From<GeoFraudRow> for GeoFraudResponse {
    fn from(row: GeoFraudRow) -> Self {
        Self {
            country: row.country,
            region: row.region,
            city: row.city,
            total_bids: row.total_bids,
            fraud_bids: row.fraud_bids,
            fraud_rate: row.fraud_rate,
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// `GET /api/v1/fraud/overview` — fraud metrics over a trailing window.
#[utoipa::path(
    get, path = "/api/v1/fraud/overview",
    tag = "Fraud",
    params(WindowParams),
    responses(
        (status = 200, description = "Fraud overview", body = FraudOverviewResponse),
        (status = 504, description = "Query deadline exceeded", body = ErrorBody),
    )
)]
pub async fn fraud_overview(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Query(params): Query<WindowParams>,
) -> Result<Json<FraudOverviewResponse>, ApiError> {
    let overview = state.alert_service.fraud_overview(owner, params.days).await?;

    Ok(Json(FraudOverviewResponse {
        window_days: overview.window_days,
        total_alerts: overview.counts.total,
        active_alerts: overview.counts.unactioned,
        blocked_bids: overview.blocked_bids,
        amount_saved: overview.amount_saved,
        threat_level: overview.threat_level.as_str().to_string(),
        alerts_by_type: overview.alerts_by_type,
        top_affected_campaigns: overview
            .top_affected_campaigns
            .into_iter()
            .map(CampaignRiskResponse::from)
            .collect(),
    }))
}

/// `GET /api/v1/fraud/alerts` — list fraud alerts with optional filters.
#[utoipa::path(
    get, path = "/api/v1/fraud/alerts",
    tag = "Fraud",
    params(FraudAlertQueryParams),
    responses(
        (status = 200, description = "Matching fraud alerts, newest first", body = [FraudAlertResponse]),
        (status = 400, description = "Malformed filter value", body = ErrorBody),
    )
)]
pub async fn list_fraud_alerts(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Query(params): Query<FraudAlertQueryParams>,
) -> Result<Json<Vec<FraudAlertResponse>>, ApiError> {
    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(
            domain::alert::status::AlertStatus::parse(s)
                .ok_or_else(|| ApiError::validation(format!("unknown status '{s}'")))?,
        ),
    };

    let alerts = state
        .alert_service
        .list_fraud_alerts(
            owner,
            FraudListRequest {
                status,
                min_severity: params.min_severity,
                detection: params.alert_type.filter(|s| !s.is_empty()),
                start_date: params.start_date,
                end_date: params.end_date,
                limit: params.limit,
            },
        )
        .await?;

    Ok(Json(
        alerts.into_iter().map(FraudAlertResponse::from).collect(),
    ))
}

/// `POST /api/v1/fraud/alerts` — create a fraud alert from a detector.
#[utoipa::path(
    post, path = "/api/v1/fraud/alerts",
    tag = "Fraud",
    request_body = CreateFraudAlertRequest,
    responses(
        (status = 201, description = "Fraud alert created", body = CreateFraudAlertResponse),
        (status = 400, description = "Missing or malformed field", body = ErrorBody),
        (status = 404, description = "Campaign absent or owned by another caller", body = ErrorBody),
    )
)]
pub async fn create_fraud_alert(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Json(request): Json<CreateFraudAlertRequest>,
) -> Result<(StatusCode, Json<CreateFraudAlertResponse>), ApiError> {
    let campaign = CampaignId::parse(&request.campaign_id).ok_or_else(|| {
        ApiError::validation(format!(
            "invalid campaign id '{}'",
            request.campaign_id
        ))
    })?;

    let alert = state.alert_service.create_fraud_alert(
        owner,
        NewFraudAlert {
            campaign,
            detection: request.alert_type,
            severity: request.severity,
            description: request.description,
            affected_entities: request.affected_user_ids,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreateFraudAlertResponse {
            alert_id: alert.id.to_string(),
        }),
    ))
}

/// `POST /api/v1/fraud/alerts/status` — transition one fraud alert.
#[utoipa::path(
    post, path = "/api/v1/fraud/alerts/status",
    tag = "Fraud",
    request_body = UpdateFraudAlertRequest,
    responses(
        (status = 200, description = "Updated fraud alert", body = FraudAlertResponse),
        (status = 400, description = "Unknown status or illegal transition", body = ErrorBody),
        (status = 404, description = "Absent or owned by another caller", body = ErrorBody),
        (status = 409, description = "Version conflict", body = ErrorBody),
    )
)]
pub async fn update_fraud_alert(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Json(request): Json<UpdateFraudAlertRequest>,
) -> Result<Json<FraudAlertResponse>, ApiError> {
    let alert = state.alert_service.update_status(
        owner,
        StatusUpdate {
            alert_id: request.alert_id,
            status: request.status,
            notes: request.notes,
            expected_version: request.expected_version,
        },
    )?;
    Ok(Json(FraudAlertResponse::from(alert)))
}

/// `GET /api/v1/fraud/trends` — daily fraud trend with bid-stat joins.
#[utoipa::path(
    get, path = "/api/v1/fraud/trends",
    tag = "Fraud",
    params(WindowParams),
    responses(
        (status = 200, description = "Daily trend, newest day first", body = [FraudTrendResponse]),
        (status = 504, description = "Query deadline exceeded", body = ErrorBody),
    )
)]
pub async fn fraud_trends(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<FraudTrendResponse>>, ApiError> {
    let trend = state.alert_service.fraud_trends(owner, params.days).await?;
    Ok(Json(trend.into_iter().map(FraudTrendResponse::from).collect()))
}

/// `GET /api/v1/fraud/devices` — device-dimension fraud breakdown.
#[utoipa::path(
    get, path = "/api/v1/fraud/devices",
    tag = "Fraud",
    params(WindowParams),
    responses(
        (status = 200, description = "Device fraud rows (empty when the bid store has no data)", body = [DeviceFraudResponse]),
    )
)]
pub async fn device_fraud(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<DeviceFraudResponse>>, ApiError> {
    let rows = state.alert_service.device_fraud(owner, params.days).await?;
    Ok(Json(rows.into_iter().map(DeviceFraudResponse::from).collect()))
}

/// `GET /api/v1/fraud/geo` — geographic fraud breakdown.
#[utoipa::path(
    get, path = "/api/v1/fraud/geo",
    tag = "Fraud",
    params(WindowParams),
    responses(
        (status = 200, description = "Geo fraud rows (empty when the bid store has no data)", body = [GeoFraudResponse]),
    )
)]
pub async fn geo_fraud(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<GeoFraudResponse>>, ApiError> {
    let rows = state.alert_service.geo_fraud(owner, params.days).await?;
    Ok(Json(rows.into_iter().map(GeoFraudResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::alert::entity::Severity;
    use domain::alert::status::{AlertStatus, apply_transition};

    fn fraud_alert() -> Alert {
        Alert::fraud(
            OwnerId(uuid::Uuid::new_v4()),
            CampaignId(uuid::Uuid::new_v4()),
            "click_velocity",
            Severity::score(8).unwrap(),
            "Abnormal click velocity",
            vec!["user-1".to_string(), "user-2".to_string()],
            Utc::now(),
        )
    }

    #[test]
    fn fraud_alert_response_shape() {
        let alert = fraud_alert();
        let json = serde_json::to_value(FraudAlertResponse::from(alert.clone())).unwrap();
        assert_eq!(json["alert_type"], "click_velocity");
        assert_eq!(json["severity"], 8);
        assert_eq!(json["status"], "active");
        assert_eq!(json["description"], "Abnormal click velocity");
        assert_eq!(json["affected_user_ids"][1], "user-2");
        assert!(json.get("resolved_at").is_none());
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn resolved_fraud_alert_carries_resolved_at() {
        let mut alert = fraud_alert();
        apply_transition(&mut alert, AlertStatus::Resolved, Some("done"), Utc::now()).unwrap();
        let json = serde_json::to_value(FraudAlertResponse::from(alert)).unwrap();
        assert_eq!(json["status"], "resolved");
        assert!(json.get("resolved_at").is_some());
        assert_eq!(json["notes"], "done");
    }

    #[test]
    fn trend_response_formats_date() {
        let point = TrendPoint {
            date: chrono::NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            detections: 4,
            blocked_bids: 12,
            amount_saved: 3.75,
        };
        let json = serde_json::to_value(FraudTrendResponse::from(point)).unwrap();
        assert_eq!(json["date"], "2025-06-15");
        assert_eq!(json["fraud_attempts"], 4);
        assert_eq!(json["blocked_bids"], 12);
    }

    #[test]
    fn create_request_defaults_affected_users() {
        let req: CreateFraudAlertRequest = serde_json::from_str(
            r#"{"campaign_id":"x","alert_type":"ip_anomaly","severity":5,"description":"d"}"#,
        )
        .unwrap();
        assert!(req.affected_user_ids.is_empty());
    }

    #[test]
    fn campaign_risk_response_shape() {
        let risk = CampaignRisk::from_attempts(
            CampaignId(uuid::Uuid::new_v4()),
            "Spring Sale".to_string(),
            12,
        );
        let json = serde_json::to_value(CampaignRiskResponse::from(risk)).unwrap();
        assert_eq!(json["campaign_name"], "Spring Sale");
        assert_eq!(json["fraud_attempts"], 12);
        assert_eq!(json["threat_level"], "critical");
    }
}
