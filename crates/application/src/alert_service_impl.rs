use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use domain::alert::aggregate::{
    Breakdown, CampaignRisk, Overview, TrailingWindow, TrendPoint, merge_bid_stats, threat_level,
};
use domain::alert::bulk::parse_batch;
use domain::alert::entity::{Alert, AlertCategory, AlertFamily, Severity};
use domain::alert::error::AlertError;
use domain::alert::query::AlertFilter;
use domain::alert::status::AlertStatus;
use domain::common::entity::{AlertId, CampaignId, OwnerId, SeverityLevel};
use ports::secondary::alert_store::AlertStore;
use ports::secondary::bid_stats::BidStats;
use ports::secondary::campaign_directory::CampaignDirectory;
use ports::secondary::metrics_port::EngineMetrics;

/// Default deadline for read operations (filter queries, aggregation).
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// How many top-affected campaigns the fraud overview reports.
const TOP_CAMPAIGN_LIMIT: usize = 5;

/// Input for creating a dashboard alert (system-internal detectors).
#[derive(Debug, Clone)]
pub struct NewDashboardAlert {
    pub category: AlertCategory,
    pub severity: SeverityLevel,
    pub title: String,
    pub message: String,
    pub campaign: Option<CampaignId>,
    pub metadata: Map<String, Value>,
}

/// Input for creating a fraud alert from a detector call.
#[derive(Debug, Clone)]
pub struct NewFraudAlert {
    pub campaign: CampaignId,
    pub detection: String,
    /// Integer severity score, validated to `[1, 10]`.
    pub severity: u8,
    pub description: String,
    pub affected_entities: Vec<String>,
}

/// List parameters for dashboard alerts. Date bounds are raw
/// `YYYY-MM-DD` strings; malformed values drop the predicate instead of
/// failing the request.
#[derive(Debug, Clone, Default)]
pub struct DashboardListRequest {
    pub category: Option<AlertCategory>,
    pub severity: Option<SeverityLevel>,
    pub status: Option<AlertStatus>,
    pub campaign: Option<CampaignId>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// List parameters for fraud alerts.
#[derive(Debug, Clone, Default)]
pub struct FraudListRequest {
    pub status: Option<AlertStatus>,
    pub min_severity: Option<u8>,
    pub detection: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

/// Single-alert status transition request.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub alert_id: String,
    pub status: String,
    pub notes: Option<String>,
    /// Optimistic concurrency check; `None` skips it.
    pub expected_version: Option<u64>,
}

/// A listed alert enriched with its campaign's display name.
#[derive(Debug, Clone)]
pub struct ListedAlert {
    pub alert: Alert,
    pub campaign_name: Option<String>,
}

/// Dashboard overview: counts, breakdowns, and the daily trend.
#[derive(Debug, Clone)]
pub struct DashboardOverview {
    pub window_days: i64,
    pub counts: Overview,
    pub breakdown: Breakdown,
    pub trend: Vec<TrendPoint>,
}

/// Fraud overview with bid-evaluation joins and campaign risk.
#[derive(Debug, Clone)]
pub struct FraudOverview {
    pub window_days: i64,
    pub counts: Overview,
    pub blocked_bids: u64,
    pub amount_saved: f64,
    pub threat_level: SeverityLevel,
    pub alerts_by_type: BTreeMap<String, u64>,
    pub top_affected_campaigns: Vec<CampaignRisk>,
}

/// Application-layer facade over the alert engine — the only component
/// the API layer calls.
///
/// Owner identity is resolved by the HTTP layer; every method here
/// takes it explicitly and scopes all storage access by it. Read
/// operations run on the blocking pool under a bounded deadline and
/// fail with a distinguishable `Timeout` instead of hanging.
pub struct AlertAppService {
    store: Arc<dyn AlertStore>,
    campaigns: Arc<dyn CampaignDirectory>,
    bid_stats: Arc<dyn BidStats>,
    metrics: Arc<dyn EngineMetrics>,
    query_timeout: Duration,
}

impl AlertAppService {
    pub fn new(
        store: Arc<dyn AlertStore>,
        campaigns: Arc<dyn CampaignDirectory>,
        bid_stats: Arc<dyn BidStats>,
        metrics: Arc<dyn EngineMetrics>,
    ) -> Self {
        Self {
            store,
            campaigns,
            bid_stats,
            metrics,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Override the read deadline (from config).
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Run a read operation on the blocking pool under the deadline.
    async fn run_read<T, F>(&self, op: F) -> Result<T, AlertError>
    where
        F: FnOnce() -> Result<T, AlertError> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = self.query_timeout;
        let task = tokio::task::spawn_blocking(op);
        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(AlertError::QueryFailed(format!(
                "read task aborted: {join_err}"
            ))),
            Err(_) => {
                self.metrics.record_query_timeout();
                Err(AlertError::Timeout {
                    secs: deadline.as_secs(),
                })
            }
        }
    }

    /// Create a dashboard alert in its initial `unread` state.
    pub fn create_alert(
        &self,
        owner: OwnerId,
        input: NewDashboardAlert,
    ) -> Result<Alert, AlertError> {
        if input.title.is_empty() {
            return Err(AlertError::MissingField("title"));
        }
        if input.message.is_empty() {
            return Err(AlertError::MissingField("message"));
        }

        let alert = Alert::dashboard(
            owner,
            input.category,
            input.severity,
            &input.title,
            &input.message,
            input.campaign,
            input.metadata,
            Utc::now(),
        );
        self.store.insert(&alert)?;
        self.metrics.record_alert_created(
            AlertFamily::Dashboard.as_str(),
            alert.category.as_str(),
            &alert.severity.label(),
        );
        tracing::info!(alert_id = %alert.id, category = %alert.category, "alert created");
        Ok(alert)
    }

    /// Create a fraud alert. The campaign must exist and belong to the
    /// caller; an unknown or foreign campaign yields `NotFound` without
    /// revealing which.
    pub fn create_fraud_alert(
        &self,
        owner: OwnerId,
        input: NewFraudAlert,
    ) -> Result<Alert, AlertError> {
        if input.detection.is_empty() {
            return Err(AlertError::MissingField("alert_type"));
        }
        if input.description.is_empty() {
            return Err(AlertError::MissingField("description"));
        }
        let severity = Severity::score(input.severity)?;

        match self.campaigns.owner_of(input.campaign)? {
            Some(campaign_owner) if campaign_owner == owner => {}
            _ => return Err(AlertError::NotFound),
        }

        let alert = Alert::fraud(
            owner,
            input.campaign,
            &input.detection,
            severity,
            &input.description,
            input.affected_entities,
            Utc::now(),
        );
        self.store.insert(&alert)?;
        self.metrics.record_alert_created(
            AlertFamily::Fraud.as_str(),
            alert.type_label(),
            &alert.severity.label(),
        );
        tracing::info!(
            alert_id = %alert.id,
            campaign = %input.campaign,
            detection = %input.detection,
            "fraud alert created"
        );
        Ok(alert)
    }

    /// Fetch one alert, scoped to the caller.
    pub async fn get_alert(&self, owner: OwnerId, alert_id: &str) -> Result<Alert, AlertError> {
        let id = AlertId::parse(alert_id)
            .ok_or_else(|| AlertError::InvalidId(alert_id.to_string()))?;
        let store = Arc::clone(&self.store);
        self.run_read(move || store.get(id, owner)?.ok_or(AlertError::NotFound))
            .await
    }

    /// List dashboard alerts, newest first, with campaign display names
    /// joined in best-effort.
    pub async fn list_alerts(
        &self,
        owner: OwnerId,
        request: DashboardListRequest,
    ) -> Result<Vec<ListedAlert>, AlertError> {
        let mut filter = AlertFilter::new(owner);
        filter.family = Some(AlertFamily::Dashboard);
        filter.category = request.category;
        filter.severity = request.severity;
        filter.status = request.status;
        filter.campaign = request.campaign;
        filter.from = parse_start_date(request.start_date.as_deref());
        filter.to = parse_end_date(request.end_date.as_deref());
        filter.limit = AlertFilter::clamp_limit(request.limit);
        filter.offset = request.offset.unwrap_or(0);

        let store = Arc::clone(&self.store);
        let alerts = self.run_read(move || store.query(&filter)).await?;

        // Resolve each referenced campaign's name once.
        let mut names: HashMap<CampaignId, Option<String>> = HashMap::new();
        let mut listed = Vec::with_capacity(alerts.len());
        for alert in alerts {
            let campaign_name = match alert.campaign {
                Some(campaign) => names
                    .entry(campaign)
                    .or_insert_with(|| self.campaigns.name_of(campaign).ok().flatten())
                    .clone(),
                None => None,
            };
            listed.push(ListedAlert {
                alert,
                campaign_name,
            });
        }
        Ok(listed)
    }

    /// List fraud alerts, newest first.
    pub async fn list_fraud_alerts(
        &self,
        owner: OwnerId,
        request: FraudListRequest,
    ) -> Result<Vec<Alert>, AlertError> {
        let mut filter = AlertFilter::new(owner);
        filter.family = Some(AlertFamily::Fraud);
        filter.status = request.status;
        filter.min_score = request.min_severity;
        filter.detection = request.detection;
        filter.from = parse_start_date(request.start_date.as_deref());
        filter.to = parse_end_date(request.end_date.as_deref());
        filter.limit = AlertFilter::clamp_limit(request.limit);

        let store = Arc::clone(&self.store);
        self.run_read(move || store.query(&filter)).await
    }

    /// Dashboard overview over a trailing window of days.
    pub async fn overview(
        &self,
        owner: OwnerId,
        days: Option<i64>,
    ) -> Result<DashboardOverview, AlertError> {
        let window = TrailingWindow::new(days);
        let since = window.start(Utc::now());
        let store = Arc::clone(&self.store);
        self.run_read(move || {
            let counts = store.aggregate_overview(owner, AlertFamily::Dashboard, since)?;
            let breakdown = store.aggregate_breakdown(owner, AlertFamily::Dashboard, since)?;
            let trend = store.aggregate_daily_trend(owner, AlertFamily::Dashboard, since)?;
            Ok(DashboardOverview {
                window_days: window.days(),
                counts,
                breakdown,
                trend,
            })
        })
        .await
    }

    /// Fraud overview: alert counts, bid-evaluation totals, threat
    /// level, by-type breakdown, and top affected campaigns.
    pub async fn fraud_overview(
        &self,
        owner: OwnerId,
        days: Option<i64>,
    ) -> Result<FraudOverview, AlertError> {
        let window = TrailingWindow::new(days);
        let since = window.start(Utc::now());
        let store = Arc::clone(&self.store);
        let bid_stats = Arc::clone(&self.bid_stats);
        let campaigns = Arc::clone(&self.campaigns);
        self.run_read(move || {
            let counts = store.aggregate_overview(owner, AlertFamily::Fraud, since)?;
            let breakdown = store.aggregate_breakdown(owner, AlertFamily::Fraud, since)?;
            let totals = bid_stats.fraud_totals(owner, since)?;

            let mut attempts = store.campaign_attempts(owner, since)?;
            attempts.truncate(TOP_CAMPAIGN_LIMIT);
            let top_affected_campaigns = attempts
                .into_iter()
                .map(|(campaign, count)| {
                    let name = campaigns
                        .name_of(campaign)
                        .ok()
                        .flatten()
                        .unwrap_or_default();
                    CampaignRisk::from_attempts(campaign, name, count)
                })
                .collect();

            Ok(FraudOverview {
                window_days: window.days(),
                threat_level: threat_level(counts.unactioned),
                counts,
                blocked_bids: totals.blocked_bids,
                amount_saved: totals.amount_saved,
                alerts_by_type: breakdown.by_type,
                top_affected_campaigns,
            })
        })
        .await
    }

    /// Daily fraud trend with blocked-bid and amount-saved joins.
    pub async fn fraud_trends(
        &self,
        owner: OwnerId,
        days: Option<i64>,
    ) -> Result<Vec<TrendPoint>, AlertError> {
        let window = TrailingWindow::new(days);
        let since = window.start(Utc::now());
        let store = Arc::clone(&self.store);
        let bid_stats = Arc::clone(&self.bid_stats);
        self.run_read(move || {
            let mut trend = store.aggregate_daily_trend(owner, AlertFamily::Fraud, since)?;
            let stats = bid_stats.fraud_daily(owner, since)?;
            merge_bid_stats(&mut trend, &stats);
            Ok(trend)
        })
        .await
    }

    /// Device-dimension fraud breakdown (empty until the bid store
    /// supplies it).
    pub async fn device_fraud(
        &self,
        owner: OwnerId,
        days: Option<i64>,
    ) -> Result<Vec<domain::alert::aggregate::DeviceFraudRow>, AlertError> {
        let since = TrailingWindow::new(days).start(Utc::now());
        let bid_stats = Arc::clone(&self.bid_stats);
        self.run_read(move || bid_stats.device_breakdown(owner, since))
            .await
    }

    /// Geographic fraud breakdown (empty until the bid store supplies
    /// it).
    pub async fn geo_fraud(
        &self,
        owner: OwnerId,
        days: Option<i64>,
    ) -> Result<Vec<domain::alert::aggregate::GeoFraudRow>, AlertError> {
        let since = TrailingWindow::new(days).start(Utc::now());
        let bid_stats = Arc::clone(&self.bid_stats);
        self.run_read(move || bid_stats.geo_breakdown(owner, since))
            .await
    }

    /// Transition one alert's status through the state machine.
    pub fn update_status(&self, owner: OwnerId, update: StatusUpdate) -> Result<Alert, AlertError> {
        let id = AlertId::parse(&update.alert_id)
            .ok_or_else(|| AlertError::InvalidId(update.alert_id.clone()))?;
        let target = AlertStatus::parse(&update.status)
            .ok_or_else(|| AlertError::InvalidStatus(update.status.clone()))?;

        let alert = self.store.update_status(
            id,
            owner,
            target,
            update.notes.as_deref(),
            update.expected_version,
            Utc::now(),
        )?;
        self.metrics
            .record_status_transition(alert.family().as_str(), target.as_str());
        tracing::info!(alert_id = %alert.id, status = %target, "alert status updated");
        Ok(alert)
    }

    /// Apply one status to a bounded batch of alerts; returns the
    /// number actually mutated.
    pub fn bulk_update_status(
        &self,
        owner: OwnerId,
        raw_ids: &[String],
        status: &str,
    ) -> Result<u64, AlertError> {
        let target = AlertStatus::parse(status)
            .ok_or_else(|| AlertError::InvalidStatus(status.to_string()))?;
        let ids = parse_batch(raw_ids)?;

        let updated = self
            .store
            .bulk_update_status(&ids, owner, target, Utc::now())?;
        self.metrics.record_bulk_update(updated);
        tracing::info!(
            requested = raw_ids.len(),
            usable = ids.len(),
            updated,
            status = %target,
            "bulk status update"
        );
        Ok(updated)
    }
}

/// Parse a `YYYY-MM-DD` lower bound into the start of that day (UTC).
/// Malformed input drops the predicate.
fn parse_start_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw?, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Parse a `YYYY-MM-DD` upper bound. The range end is exclusive, so a
/// calendar date expands to the start of the following day to keep the
/// named day fully inside the range.
fn parse_end_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw?, "%Y-%m-%d").ok()?;
    Some(date.succ_opt()?.and_hms_opt(0, 0, 0)?.and_utc())
}
