use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

use application::alert_service_impl::{
    DashboardListRequest, ListedAlert, NewDashboardAlert, StatusUpdate,
};
use domain::alert::entity::{Alert, AlertCategory};
use domain::common::entity::{CampaignId, OwnerId, SeverityLevel};
use domain::alert::status::AlertStatus;

use super::error::{ApiError, ErrorBody};
use super::state::AppState;

// ── Query parameter DTOs ────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
pub struct AlertQueryParams {
    /// Filter by category ("fraud", "budget", "performance", "model",
    /// "system", "campaign").
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    /// Filter by severity ("low", "medium", "high", "critical").
    pub severity: Option<String>,
    /// Filter by status ("unread", "read", "acknowledged", "resolved",
    /// "dismissed").
    pub status: Option<String>,
    /// Filter by campaign UUID. Malformed values drop the predicate.
    pub campaign_id: Option<String>,
    /// Detection-date lower bound, `YYYY-MM-DD`. Malformed values drop
    /// the predicate.
    pub start_date: Option<String>,
    /// Detection-date upper bound (inclusive of the named day).
    pub end_date: Option<String>,
    /// Maximum entries to return (default 100, max 1000).
    pub limit: Option<usize>,
    /// Number of entries to skip (default 0).
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WindowParams {
    /// Trailing window in days (1-365, default 30).
    pub days: Option<i64>,
}

// ── Request/response DTOs ───────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAlertRequest {
    /// Alert category.
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Severity level name.
    pub severity: String,
    pub title: String,
    pub message: String,
    /// Optional campaign reference (UUID).
    pub campaign_id: Option<String>,
    /// Opaque key-value payload stored with the alert.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateAlertResponse {
    pub alert_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub alert_id: String,
    /// Target status within the alert's family vocabulary.
    pub status: String,
    /// Operator notes stored with the transition.
    pub notes: Option<String>,
    /// Optimistic concurrency check: fails with 409 when the stored
    /// version differs.
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkUpdateRequest {
    /// Up to 100 alert UUIDs; unparseable entries are dropped.
    pub alert_ids: Vec<String>,
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct BulkUpdateResponse {
    /// Number of alerts actually mutated; may be less than the request
    /// size without that being an error.
    pub updated_count: u64,
}

#[derive(Serialize, ToSchema)]
pub struct AlertResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub severity: String,
    pub status: String,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    /// Display name of the referenced campaign; empty when unknown.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub campaign_name: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub version: u64,
}

impl AlertResponse {
    fn from_alert(alert: Alert, campaign_name: Option<String>) -> Self {
        Self {
            id: alert.id.to_string(),
            alert_type: alert.category.as_str().to_string(),
            severity: alert.severity.label(),
            status: alert.status.as_str().to_string(),
            title: alert.title,
            message: alert.message,
            campaign_id: alert.campaign.map(|c| c.to_string()),
            campaign_name: campaign_name.unwrap_or_default(),
            metadata: alert.metadata,
            created_at: alert.created_at,
            updated_at: alert.updated_at,
            acknowledged_at: alert.acknowledged_at,
            resolved_at: alert.resolved_at,
            notes: alert.notes,
            version: alert.version,
        }
    }
}

impl From<ListedAlert> for AlertResponse {
    fn from(listed: ListedAlert) -> Self {
        Self::from_alert(listed.alert, listed.campaign_name)
    }
}

#[derive(Serialize, ToSchema)]
pub struct AlertListResponse {
    pub alerts: Vec<AlertResponse>,
    pub count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct TrendBucket {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

#[derive(Serialize, ToSchema)]
pub struct AlertOverviewResponse {
    pub window_days: i64,
    pub total_alerts: u64,
    pub unread_alerts: u64,
    pub critical_alerts: u64,
    pub alerts_by_type: BTreeMap<String, u64>,
    pub alerts_by_severity: BTreeMap<String, u64>,
    /// Daily detection counts, newest day first; days with no alerts
    /// are absent.
    pub recent_trend: Vec<TrendBucket>,
}

// ── Parse helpers ───────────────────────────────────────────────────

fn parse_category(raw: Option<&str>) -> Result<Option<AlertCategory>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => AlertCategory::parse(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("unknown alert type '{s}'"))),
    }
}

fn parse_severity_level(raw: Option<&str>) -> Result<Option<SeverityLevel>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => SeverityLevel::parse(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("unknown severity '{s}'"))),
    }
}

fn parse_status(raw: Option<&str>) -> Result<Option<AlertStatus>, ApiError> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => AlertStatus::parse(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("unknown status '{s}'"))),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// `GET /api/v1/alerts` — list dashboard alerts with optional filters.
#[utoipa::path(
    get, path = "/api/v1/alerts",
    tag = "Alerts",
    params(AlertQueryParams),
    responses(
        (status = 200, description = "Matching alerts, newest first", body = AlertListResponse),
        (status = 400, description = "Malformed filter value", body = ErrorBody),
        (status = 504, description = "Query deadline exceeded", body = ErrorBody),
    )
)]
pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Query(params): Query<AlertQueryParams>,
) -> Result<Json<AlertListResponse>, ApiError> {
    let request = DashboardListRequest {
        category: parse_category(params.alert_type.as_deref())?,
        severity: parse_severity_level(params.severity.as_deref())?,
        status: parse_status(params.status.as_deref())?,
        // malformed campaign references drop the predicate
        campaign: params.campaign_id.as_deref().and_then(CampaignId::parse),
        start_date: params.start_date,
        end_date: params.end_date,
        limit: params.limit,
        offset: params.offset,
    };

    let listed = state.alert_service.list_alerts(owner, request).await?;
    let alerts: Vec<AlertResponse> = listed.into_iter().map(AlertResponse::from).collect();
    Ok(Json(AlertListResponse {
        count: alerts.len(),
        alerts,
    }))
}

/// `GET /api/v1/alerts/{id}` — fetch one alert.
#[utoipa::path(
    get, path = "/api/v1/alerts/{id}",
    tag = "Alerts",
    params(("id" = String, Path, description = "Alert identifier")),
    responses(
        (status = 200, description = "The alert", body = AlertResponse),
        (status = 404, description = "Absent or owned by another caller", body = ErrorBody),
    )
)]
pub async fn get_alert(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
) -> Result<Json<AlertResponse>, ApiError> {
    let alert = state.alert_service.get_alert(owner, &id).await?;
    Ok(Json(AlertResponse::from_alert(alert, None)))
}

/// `POST /api/v1/alerts` — create a dashboard alert.
#[utoipa::path(
    post, path = "/api/v1/alerts",
    tag = "Alerts",
    request_body = CreateAlertRequest,
    responses(
        (status = 201, description = "Alert created", body = CreateAlertResponse),
        (status = 400, description = "Missing or malformed field", body = ErrorBody),
    )
)]
pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Json(request): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<CreateAlertResponse>), ApiError> {
    let category = AlertCategory::parse(&request.alert_type)
        .ok_or_else(|| ApiError::validation(format!("unknown alert type '{}'", request.alert_type)))?;
    let severity = SeverityLevel::parse(&request.severity)
        .ok_or_else(|| ApiError::validation(format!("unknown severity '{}'", request.severity)))?;

    let alert = state.alert_service.create_alert(
        owner,
        NewDashboardAlert {
            category,
            severity,
            title: request.title,
            message: request.message,
            campaign: request.campaign_id.as_deref().and_then(CampaignId::parse),
            metadata: request.metadata,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAlertResponse {
            alert_id: alert.id.to_string(),
        }),
    ))
}

/// `GET /api/v1/alerts/overview` — windowed counts, breakdowns, trend.
#[utoipa::path(
    get, path = "/api/v1/alerts/overview",
    tag = "Alerts",
    params(WindowParams),
    responses(
        (status = 200, description = "Alert statistics", body = AlertOverviewResponse),
        (status = 504, description = "Query deadline exceeded", body = ErrorBody),
    )
)]
pub async fn alert_overview(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Query(params): Query<WindowParams>,
) -> Result<Json<AlertOverviewResponse>, ApiError> {
    let overview = state.alert_service.overview(owner, params.days).await?;

    Ok(Json(AlertOverviewResponse {
        window_days: overview.window_days,
        total_alerts: overview.counts.total,
        unread_alerts: overview.counts.unactioned,
        critical_alerts: overview.counts.top_severity,
        alerts_by_type: overview.breakdown.by_type,
        alerts_by_severity: overview.breakdown.by_severity,
        recent_trend: overview
            .trend
            .into_iter()
            .map(|point| TrendBucket {
                date: point.date.format("%Y-%m-%d").to_string(),
                count: point.detections,
            })
            .collect(),
    }))
}

/// `POST /api/v1/alerts/status` — transition one alert's status.
#[utoipa::path(
    post, path = "/api/v1/alerts/status",
    tag = "Alerts",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated alert", body = AlertResponse),
        (status = 400, description = "Unknown status or illegal transition", body = ErrorBody),
        (status = 404, description = "Absent or owned by another caller", body = ErrorBody),
        (status = 409, description = "Version conflict", body = ErrorBody),
    )
)]
pub async fn update_alert_status(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<AlertResponse>, ApiError> {
    let alert = state.alert_service.update_status(
        owner,
        StatusUpdate {
            alert_id: request.alert_id,
            status: request.status,
            notes: request.notes,
            expected_version: request.expected_version,
        },
    )?;
    Ok(Json(AlertResponse::from_alert(alert, None)))
}

/// `POST /api/v1/alerts/bulk-status` — transition up to 100 alerts.
#[utoipa::path(
    post, path = "/api/v1/alerts/bulk-status",
    tag = "Alerts",
    request_body = BulkUpdateRequest,
    responses(
        (status = 200, description = "Count of alerts mutated", body = BulkUpdateResponse),
        (status = 400, description = "Empty batch, unknown status, or over the 100-ID cap", body = ErrorBody),
    )
)]
pub async fn bulk_update_alert_status(
    State(state): State<Arc<AppState>>,
    Extension(owner): Extension<OwnerId>,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<BulkUpdateResponse>, ApiError> {
    let updated_count =
        state
            .alert_service
            .bulk_update_status(owner, &request.alert_ids, &request.status)?;
    Ok(Json(BulkUpdateResponse { updated_count }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_helpers_accept_known_values() {
        assert_eq!(
            parse_category(Some("budget")).unwrap(),
            Some(AlertCategory::Budget)
        );
        assert_eq!(parse_category(None).unwrap(), None);
        assert_eq!(parse_category(Some("")).unwrap(), None);
        assert!(parse_category(Some("mystery")).is_err());

        assert_eq!(
            parse_severity_level(Some("critical")).unwrap(),
            Some(SeverityLevel::Critical)
        );
        assert!(parse_severity_level(Some("urgent")).is_err());

        assert_eq!(
            parse_status(Some("acknowledged")).unwrap(),
            Some(AlertStatus::Acknowledged)
        );
        assert!(parse_status(Some("snoozed")).is_err());
    }

    #[test]
    fn alert_response_serialization_shape() {
        let alert = Alert::dashboard(
            OwnerId(uuid::Uuid::new_v4()),
            AlertCategory::Budget,
            SeverityLevel::High,
            "Budget threshold",
            "90% of daily budget spent",
            Some(CampaignId(uuid::Uuid::new_v4())),
            Map::new(),
            Utc::now(),
        );
        let resp = AlertResponse::from_alert(alert.clone(), Some("Spring Sale".to_string()));
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["type"], "budget");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["status"], "unread");
        assert_eq!(json["campaign_name"], "Spring Sale");
        assert_eq!(json["version"], 0);
        // unset optionals are absent
        assert!(json.get("acknowledged_at").is_none());
        assert!(json.get("resolved_at").is_none());
        assert!(json.get("notes").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn query_params_deserialize_with_type_rename() {
        let params: AlertQueryParams =
            serde_json::from_str(r#"{"type":"fraud","limit":50}"#).unwrap();
        assert_eq!(params.alert_type.as_deref(), Some("fraud"));
        assert_eq!(params.limit, Some(50));
        assert!(params.status.is_none());
    }

    #[test]
    fn create_request_defaults_metadata() {
        let req: CreateAlertRequest = serde_json::from_str(
            r#"{"type":"system","severity":"low","title":"t","message":"m"}"#,
        )
        .unwrap();
        assert!(req.metadata.is_empty());
        assert!(req.campaign_id.is_none());
    }

    #[test]
    fn overview_response_serialization() {
        let resp = AlertOverviewResponse {
            window_days: 30,
            total_alerts: 10,
            unread_alerts: 3,
            critical_alerts: 2,
            alerts_by_type: BTreeMap::from([("budget".to_string(), 10)]),
            alerts_by_severity: BTreeMap::from([("high".to_string(), 10)]),
            recent_trend: vec![TrendBucket {
                date: "2025-06-15".to_string(),
                count: 4,
            }],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["total_alerts"], 10);
        assert_eq!(json["unread_alerts"], 3);
        assert_eq!(json["critical_alerts"], 2);
        assert_eq!(json["recent_trend"][0]["date"], "2025-06-15");
    }
}
