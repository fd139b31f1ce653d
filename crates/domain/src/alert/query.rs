use chrono::{DateTime, Utc};

use crate::common::entity::{CampaignId, OwnerId, SeverityLevel};

use super::entity::{Alert, AlertCategory, AlertFamily, Severity};
use super::status::AlertStatus;

/// Default page size when the caller does not supply a limit.
pub const DEFAULT_LIMIT: usize = 100;
/// Hard cap on a single page.
pub const MAX_LIMIT: usize = 1000;

/// Multi-predicate filter for owner-scoped alert lookups.
///
/// The owner predicate is mandatory; everything else is optional and
/// ANDed. The detection-time range is half-open: `[from, to)`.
/// Results are always ordered newest-detected-first.
#[derive(Debug, Clone)]
pub struct AlertFilter {
    pub owner: OwnerId,
    pub family: Option<AlertFamily>,
    pub category: Option<AlertCategory>,
    /// Fraud-side type axis: exact detector label match.
    pub detection: Option<String>,
    pub status: Option<AlertStatus>,
    /// Exact level match (dashboard scale).
    pub severity: Option<SeverityLevel>,
    /// Minimum score (fraud scale).
    pub min_score: Option<u8>,
    pub campaign: Option<CampaignId>,
    /// Start of detection-time range (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// End of detection-time range (exclusive).
    pub to: Option<DateTime<Utc>>,
    pub limit: usize,
    pub offset: usize,
}

impl AlertFilter {
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            family: None,
            category: None,
            detection: None,
            status: None,
            severity: None,
            min_score: None,
            campaign: None,
            from: None,
            to: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Clamp a caller-supplied limit to `[1, MAX_LIMIT]`, defaulting
    /// when absent or zero.
    pub fn clamp_limit(requested: Option<usize>) -> usize {
        match requested {
            None | Some(0) => DEFAULT_LIMIT,
            Some(n) => n.min(MAX_LIMIT),
        }
    }

    /// Check whether an alert matches all active predicates.
    pub fn matches(&self, alert: &Alert) -> bool {
        if alert.owner_id != self.owner {
            return false;
        }
        if let Some(family) = self.family
            && alert.family() != family
        {
            return false;
        }
        if let Some(category) = self.category
            && alert.category != category
        {
            return false;
        }
        if let Some(ref detection) = self.detection
            && alert.detection.as_deref() != Some(detection.as_str())
        {
            return false;
        }
        if let Some(status) = self.status
            && alert.status != status
        {
            return false;
        }
        if let Some(level) = self.severity
            && alert.severity != Severity::Level(level)
        {
            return false;
        }
        if let Some(min) = self.min_score
            && alert.severity.rank() < min
        {
            return false;
        }
        if let Some(campaign) = self.campaign
            && alert.campaign != Some(campaign)
        {
            return false;
        }
        if let Some(from) = self.from
            && alert.created_at < from
        {
            return false;
        }
        if let Some(to) = self.to
            && alert.created_at >= to
        {
            return false;
        }
        true
    }
}
