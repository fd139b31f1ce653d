use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::entity::{AlertId, CampaignId, OwnerId, SeverityLevel};

use super::error::AlertError;
use super::status::AlertStatus;

/// The (severity-scale, status-vocabulary) pairing that governs an
/// alert's legal transitions.
///
/// - `Dashboard`: user-scoped alerts with a four-level severity and the
///   `unread → … → resolved/dismissed` vocabulary.
/// - `Fraud`: campaign-scoped detector output with an integer 1-10
///   severity score and the `active → … → resolved/false_positive`
///   vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFamily {
    Dashboard,
    Fraud,
}

impl AlertFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Fraud => "fraud",
        }
    }
}

/// Closed category taxonomy for dashboard alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Fraud,
    Budget,
    Performance,
    Model,
    System,
    Campaign,
}

impl AlertCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fraud => "fraud",
            Self::Budget => "budget",
            Self::Performance => "performance",
            Self::Model => "model",
            Self::System => "system",
            Self::Campaign => "campaign",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fraud" => Some(Self::Fraud),
            "budget" => Some(Self::Budget),
            "performance" => Some(Self::Performance),
            "model" => Some(Self::Model),
            "system" => Some(Self::System),
            "campaign" => Some(Self::Campaign),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity on one ordered scale across both families.
///
/// Dashboard alerts carry a named level, fraud alerts an integer score
/// in `[1, 10]`. `rank()` projects both onto the score scale so that
/// aggregation can compare severities regardless of family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Severity {
    Level(SeverityLevel),
    Score(u8),
}

/// Fraud scores at or above this value count as top-of-scale,
/// equivalent to `critical` on the dashboard side.
pub const TOP_SCORE: u8 = 8;

impl Severity {
    /// Validate and wrap a fraud severity score.
    pub fn score(value: u8) -> Result<Self, AlertError> {
        if (1..=10).contains(&value) {
            Ok(Self::Score(value))
        } else {
            Err(AlertError::InvalidSeverity(value.to_string()))
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Level(level) => level.rank(),
            Self::Score(n) => n,
        }
    }

    /// Whether this severity sits at the top of its scale
    /// (`critical` / score ≥ 8).
    pub fn is_top(self) -> bool {
        match self {
            Self::Level(level) => level == SeverityLevel::Critical,
            Self::Score(n) => n >= TOP_SCORE,
        }
    }

    /// Label used in by-severity breakdowns: the level name for
    /// dashboard alerts, the decimal score for fraud alerts.
    pub fn label(self) -> String {
        match self {
            Self::Level(level) => level.as_str().to_string(),
            Self::Score(n) => n.to_string(),
        }
    }
}

/// A materialized detection signal with lifecycle state.
///
/// One entity covers both alert families; `family()` is derived from the
/// status vocabulary the alert was created with. `title`, `message`,
/// `metadata`, `severity`, and `created_at` are immutable after
/// creation; every mutation stamps `updated_at` and bumps `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub owner_id: OwnerId,
    /// Referenced campaign; always present for fraud alerts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<CampaignId>,
    pub category: AlertCategory,
    /// Detector label for fraud alerts (e.g. `click_velocity`),
    /// the fraud-side "type" axis for filtering and breakdowns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection: Option<String>,
    pub severity: Severity,
    pub status: AlertStatus,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Opaque identifiers of affected users/devices — fraud alerts only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_entities: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Stamped once, on the first transition into
    /// `acknowledged`/`investigating`; never cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Stamped on entering `resolved`/`false_positive`; never cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Monotonic mutation counter for optimistic concurrency checks.
    #[serde(default)]
    pub version: u64,
}

impl Alert {
    /// Create a dashboard alert in its initial `unread` state.
    pub fn dashboard(
        owner_id: OwnerId,
        category: AlertCategory,
        severity: SeverityLevel,
        title: &str,
        message: &str,
        campaign: Option<CampaignId>,
        metadata: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AlertId::generate(),
            owner_id,
            campaign,
            category,
            detection: None,
            severity: Severity::Level(severity),
            status: AlertStatus::Unread,
            title: title.to_string(),
            message: message.to_string(),
            metadata,
            affected_entities: Vec::new(),
            created_at: now,
            updated_at: now,
            acknowledged_at: None,
            resolved_at: None,
            notes: String::new(),
            version: 0,
        }
    }

    /// Create a fraud alert in its initial `active` state.
    ///
    /// The owner must already be resolved through campaign ownership;
    /// `severity` must come from [`Severity::score`].
    pub fn fraud(
        owner_id: OwnerId,
        campaign: CampaignId,
        detection: &str,
        severity: Severity,
        description: &str,
        affected_entities: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AlertId::generate(),
            owner_id,
            campaign: Some(campaign),
            category: AlertCategory::Fraud,
            detection: Some(detection.to_string()),
            severity,
            status: AlertStatus::Active,
            title: String::new(),
            message: description.to_string(),
            metadata: Map::new(),
            affected_entities,
            created_at: now,
            updated_at: now,
            acknowledged_at: None,
            resolved_at: None,
            notes: String::new(),
            version: 0,
        }
    }

    /// Family derived from the severity scale the alert was created
    /// with. Severity is immutable, so the family never shifts even
    /// when the alert reaches the shared `resolved` terminal.
    pub fn family(&self) -> AlertFamily {
        match self.severity {
            Severity::Level(_) => AlertFamily::Dashboard,
            Severity::Score(_) => AlertFamily::Fraud,
        }
    }

    /// Whether the alert is still awaiting operator attention
    /// (`unread` / `active`).
    pub fn is_unactioned(&self) -> bool {
        matches!(self.status, AlertStatus::Unread | AlertStatus::Active)
    }

    pub fn is_top_severity(&self) -> bool {
        self.severity.is_top()
    }

    /// Label used in by-type breakdowns: category for dashboard alerts,
    /// the detector label for fraud alerts.
    pub fn type_label(&self) -> &str {
        match self.family() {
            AlertFamily::Dashboard => self.category.as_str(),
            AlertFamily::Fraud => self
                .detection
                .as_deref()
                .unwrap_or(AlertCategory::Fraud.as_str()),
        }
    }

    /// Calendar day the alert was detected, for trend bucketing.
    pub fn detected_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}
