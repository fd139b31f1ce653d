use chrono::{DateTime, Utc};

use domain::alert::aggregate::{BlockedBidTotals, DailyBidStats};
use domain::alert::error::AlertError;
use domain::common::entity::OwnerId;
use ports::secondary::bid_stats::BidStats;

/// Placeholder bid-evaluation adapter for deployments without a bid
/// store connection: zero totals, empty series, never an error.
///
/// Device/geo breakdowns fall through to the trait's empty defaults.
pub struct UnimplementedBidStats;

impl BidStats for UnimplementedBidStats {
    fn fraud_totals(
        &self,
        _owner: OwnerId,
        _since: DateTime<Utc>,
    ) -> Result<BlockedBidTotals, AlertError> {
        Ok(BlockedBidTotals::default())
    }

    fn fraud_daily(
        &self,
        _owner: OwnerId,
        _since: DateTime<Utc>,
    ) -> Result<Vec<DailyBidStats>, AlertError> {
        Ok(Vec::new())
    }
}
