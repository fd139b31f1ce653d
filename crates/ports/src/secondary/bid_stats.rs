use chrono::{DateTime, Utc};

use domain::alert::aggregate::{BlockedBidTotals, DailyBidStats, DeviceFraudRow, GeoFraudRow};
use domain::alert::error::AlertError;
use domain::common::entity::OwnerId;

/// Read-side contract to the bid-evaluation store: fraud-flagged bid
/// counts and the bid-price sums behind "amount saved" figures.
///
/// Device and geo breakdowns have default implementations returning
/// empty series — collaborators that cannot supply those dimensions
/// yet must not turn dashboard views into errors.
pub trait BidStats: Send + Sync {
    /// Window totals of fraud-flagged bids for the owner.
    fn fraud_totals(
        &self,
        owner: OwnerId,
        since: DateTime<Utc>,
    ) -> Result<BlockedBidTotals, AlertError>;

    /// Per-day fraud-flagged bid figures, for trend enrichment.
    fn fraud_daily(
        &self,
        owner: OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyBidStats>, AlertError>;

    /// Fraud rates grouped by device/browser/OS.
    fn device_breakdown(
        &self,
        _owner: OwnerId,
        _since: DateTime<Utc>,
    ) -> Result<Vec<DeviceFraudRow>, AlertError> {
        Ok(Vec::new())
    }

    /// Fraud rates grouped by country/region/city.
    fn geo_breakdown(
        &self,
        _owner: OwnerId,
        _since: DateTime<Utc>,
    ) -> Result<Vec<GeoFraudRow>, AlertError> {
        Ok(Vec::new())
    }
}
