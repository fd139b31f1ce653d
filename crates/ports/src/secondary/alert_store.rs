use chrono::{DateTime, Utc};

use domain::alert::aggregate::{Breakdown, Overview, TrendPoint};
use domain::alert::entity::{Alert, AlertFamily};
use domain::alert::error::AlertError;
use domain::alert::query::AlertFilter;
use domain::alert::status::AlertStatus;
use domain::common::entity::{AlertId, CampaignId, OwnerId};

/// Durable alert storage with owner-scoped retrieval and windowed
/// aggregation. No business logic beyond applying the domain state
/// machine inside `update_status`/`bulk_update_status`.
///
/// Implementations may use redb or in-memory storage. Every operation
/// taking an owner implicitly filters by it; rows outside that scope
/// are never returned or mutated.
pub trait AlertStore: Send + Sync {
    /// Persist a newly created alert.
    fn insert(&self, alert: &Alert) -> Result<(), AlertError>;

    /// Retrieve one alert by ID, scoped to the owner.
    ///
    /// Returns `Ok(None)` both when the alert is absent and when it is
    /// owned by another caller.
    fn get(&self, id: AlertId, owner: OwnerId) -> Result<Option<Alert>, AlertError>;

    /// Query alerts matching the filter, newest-detected-first, with
    /// the filter's offset/limit applied.
    fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AlertError>;

    /// Apply a status transition to one alert through the domain state
    /// machine, atomically. When `expected_version` is given, a
    /// mismatch with the stored version fails with `Conflict`.
    ///
    /// Returns the updated alert. Absent or non-owned → `NotFound`.
    fn update_status(
        &self,
        id: AlertId,
        owner: OwnerId,
        target: AlertStatus,
        notes: Option<&str>,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Alert, AlertError>;

    /// Apply one target status to every ID in the set that exists, is
    /// owned by the caller, and can legally transition to the target.
    /// IDs failing those checks are silently excluded. The whole
    /// update is a single atomic storage operation.
    ///
    /// Returns the number of alerts actually mutated.
    fn bulk_update_status(
        &self,
        ids: &[AlertId],
        owner: OwnerId,
        target: AlertStatus,
        now: DateTime<Utc>,
    ) -> Result<u64, AlertError>;

    /// Overview counts for one family over alerts detected at or after
    /// `since`.
    fn aggregate_overview(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Overview, AlertError>;

    /// By-type and by-severity counts for one family in the window.
    fn aggregate_breakdown(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Breakdown, AlertError>;

    /// Day-bucketed detection counts for one family in the window,
    /// newest day first; days with no alerts are absent.
    fn aggregate_daily_trend(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, AlertError>;

    /// Fraud-alert counts per campaign in the window, for top-affected
    /// campaign views. Campaigns without alerts are absent.
    fn campaign_attempts(
        &self,
        owner: OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<(CampaignId, u64)>, AlertError>;
}
