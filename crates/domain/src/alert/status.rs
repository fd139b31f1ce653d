use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Alert, AlertFamily};
use super::error::AlertError;

/// Lifecycle status across both alert families.
///
/// Each variant belongs to exactly one family vocabulary; the state
/// machine rejects targets from the other family and enforces the legal
/// edges below. Terminal states have no outbound edges — reopening is
/// not supported.
///
/// Dashboard: `unread → {read, acknowledged, resolved, dismissed}`,
/// `read → {acknowledged, resolved, dismissed}`,
/// `acknowledged → {resolved, dismissed}`.
///
/// Fraud: `active → {investigating, resolved, false_positive}`,
/// `investigating → {resolved, false_positive}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Unread,
    Read,
    Acknowledged,
    Resolved,
    Dismissed,
    Active,
    Investigating,
    FalsePositive,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
            Self::Active => "active",
            Self::Investigating => "investigating",
            Self::FalsePositive => "false_positive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unread" => Some(Self::Unread),
            "read" => Some(Self::Read),
            "acknowledged" => Some(Self::Acknowledged),
            "resolved" => Some(Self::Resolved),
            "dismissed" => Some(Self::Dismissed),
            "active" => Some(Self::Active),
            "investigating" => Some(Self::Investigating),
            "false_positive" => Some(Self::FalsePositive),
            _ => None,
        }
    }

    /// The vocabulary this status belongs to.
    ///
    /// `resolved` is shared terminology between the two families in the
    /// wire format, but dashboard `resolved` and fraud `resolved` are
    /// reached through different vocabularies; the shared variant is
    /// assigned per-transition by [`apply_transition`], which only
    /// admits same-family targets.
    pub fn family(self) -> AlertFamily {
        match self {
            Self::Unread | Self::Read | Self::Acknowledged | Self::Dismissed => {
                AlertFamily::Dashboard
            }
            Self::Active | Self::Investigating | Self::FalsePositive => AlertFamily::Fraud,
            // Resolved exists in both vocabularies; treat it as
            // family-agnostic terminal (see member_of).
            Self::Resolved => AlertFamily::Dashboard,
        }
    }

    /// Whether this status is part of the given family's vocabulary.
    pub fn member_of(self, family: AlertFamily) -> bool {
        match self {
            Self::Resolved => true,
            other => other.family() == family,
        }
    }

    /// Terminal states have no outbound transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed | Self::FalsePositive)
    }

    /// Whether entering this status stamps `resolved_at`.
    fn stamps_resolved_at(self) -> bool {
        matches!(self, Self::Resolved | Self::FalsePositive)
    }

    /// Whether entering this status stamps `acknowledged_at`.
    fn stamps_acknowledged_at(self) -> bool {
        matches!(self, Self::Acknowledged | Self::Investigating)
    }

    /// Legal edges of the per-family state machines.
    pub fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Unread => matches!(
                target,
                Self::Read | Self::Acknowledged | Self::Resolved | Self::Dismissed
            ),
            Self::Read => matches!(target, Self::Acknowledged | Self::Resolved | Self::Dismissed),
            Self::Acknowledged => matches!(target, Self::Resolved | Self::Dismissed),
            Self::Active => matches!(
                target,
                Self::Investigating | Self::Resolved | Self::FalsePositive
            ),
            Self::Investigating => matches!(target, Self::Resolved | Self::FalsePositive),
            Self::Resolved | Self::Dismissed | Self::FalsePositive => false,
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply a status transition to a single alert.
///
/// Rejects targets outside the alert's family vocabulary and illegal
/// edges without touching the alert. On success: `status` and `notes`
/// are updated, `updated_at = now`, `version` is bumped,
/// `acknowledged_at` is stamped on first entry into
/// `acknowledged`/`investigating`, and `resolved_at` on entry into
/// `resolved`/`false_positive`.
pub fn apply_transition(
    alert: &mut Alert,
    target: AlertStatus,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), AlertError> {
    if !target.member_of(alert.family()) {
        return Err(AlertError::InvalidStatus(format!(
            "status '{target}' is not valid for {} alerts",
            alert.family().as_str()
        )));
    }
    if !alert.status.can_transition_to(target) {
        return Err(AlertError::IllegalTransition {
            from: alert.status,
            to: target,
        });
    }

    alert.status = target;
    alert.updated_at = now;
    alert.version += 1;
    if let Some(notes) = notes {
        alert.notes = notes.to_string();
    }
    if target.stamps_acknowledged_at() && alert.acknowledged_at.is_none() {
        alert.acknowledged_at = Some(now);
    }
    if target.stamps_resolved_at() && alert.resolved_at.is_none() {
        alert.resolved_at = Some(now);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::entity::{AlertCategory, Severity};
    use crate::common::entity::{CampaignId, OwnerId, SeverityLevel};
    use chrono::TimeZone;
    use serde_json::Map;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 13, 0, 0).unwrap()
    }

    fn dashboard_alert() -> Alert {
        Alert::dashboard(
            OwnerId(uuid::Uuid::new_v4()),
            AlertCategory::System,
            SeverityLevel::Low,
            "Ingest lag",
            "Bid event ingest lag above 5m",
            None,
            Map::new(),
            t0(),
        )
    }

    fn fraud_alert() -> Alert {
        Alert::fraud(
            OwnerId(uuid::Uuid::new_v4()),
            CampaignId(uuid::Uuid::new_v4()),
            "bot_detection",
            Severity::score(6).unwrap(),
            "Bot-like interaction pattern",
            vec![],
            t0(),
        )
    }

    #[test]
    fn status_parse_roundtrip() {
        for s in [
            "unread",
            "read",
            "acknowledged",
            "resolved",
            "dismissed",
            "active",
            "investigating",
            "false_positive",
        ] {
            assert_eq!(AlertStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(AlertStatus::parse("reopened").is_none());
    }

    #[test]
    fn resolved_belongs_to_both_vocabularies() {
        assert!(AlertStatus::Resolved.member_of(AlertFamily::Dashboard));
        assert!(AlertStatus::Resolved.member_of(AlertFamily::Fraud));
        assert!(!AlertStatus::Dismissed.member_of(AlertFamily::Fraud));
        assert!(!AlertStatus::Investigating.member_of(AlertFamily::Dashboard));
    }

    #[test]
    fn legal_dashboard_walk() {
        let mut a = dashboard_alert();
        apply_transition(&mut a, AlertStatus::Read, None, t1()).unwrap();
        apply_transition(&mut a, AlertStatus::Acknowledged, None, t1()).unwrap();
        apply_transition(&mut a, AlertStatus::Resolved, Some("fixed"), t1()).unwrap();
        assert_eq!(a.status, AlertStatus::Resolved);
        assert_eq!(a.notes, "fixed");
        assert_eq!(a.version, 3);
    }

    #[test]
    fn cross_family_target_rejected_without_mutation() {
        let mut a = dashboard_alert();
        let before = a.clone();
        let err = apply_transition(&mut a, AlertStatus::Investigating, None, t1()).unwrap_err();
        assert!(matches!(err, AlertError::InvalidStatus(_)));
        assert_eq!(a.updated_at, before.updated_at);
        assert_eq!(a.status, before.status);
        assert_eq!(a.version, before.version);
    }

    #[test]
    fn illegal_edge_rejected_without_mutation() {
        let mut a = dashboard_alert();
        apply_transition(&mut a, AlertStatus::Resolved, None, t1()).unwrap();
        let before = a.clone();
        let err = apply_transition(&mut a, AlertStatus::Dismissed, None, t1()).unwrap_err();
        assert!(matches!(err, AlertError::IllegalTransition { .. }));
        assert_eq!(a.updated_at, before.updated_at);
    }

    #[test]
    fn skipping_to_terminal_is_legal() {
        let mut a = dashboard_alert();
        apply_transition(&mut a, AlertStatus::Dismissed, None, t1()).unwrap();
        assert!(a.status.is_terminal());
        // dismissed is terminal but not resolved-class
        assert!(a.resolved_at.is_none());
    }

    #[test]
    fn acknowledged_at_stamped_once() {
        let mut a = dashboard_alert();
        assert!(a.acknowledged_at.is_none());
        apply_transition(&mut a, AlertStatus::Acknowledged, None, t1()).unwrap();
        assert_eq!(a.acknowledged_at, Some(t1()));
        apply_transition(&mut a, AlertStatus::Resolved, None, t1()).unwrap();
        assert_eq!(a.acknowledged_at, Some(t1()));
    }

    #[test]
    fn resolved_at_stamped_on_resolved_class() {
        let mut a = fraud_alert();
        apply_transition(&mut a, AlertStatus::FalsePositive, None, t1()).unwrap();
        assert_eq!(a.resolved_at, Some(t1()));

        let mut b = fraud_alert();
        apply_transition(&mut b, AlertStatus::Resolved, None, t1()).unwrap();
        assert_eq!(b.resolved_at, Some(t1()));
    }

    #[test]
    fn fraud_walk_through_investigating() {
        let mut a = fraud_alert();
        apply_transition(&mut a, AlertStatus::Investigating, None, t1()).unwrap();
        assert_eq!(a.acknowledged_at, Some(t1()));
        apply_transition(&mut a, AlertStatus::Resolved, Some("confirmed benign"), t1()).unwrap();
        assert_eq!(a.resolved_at, Some(t1()));
        assert_eq!(a.notes, "confirmed benign");
    }

    #[test]
    fn terminal_states_refuse_all_targets() {
        for terminal in [
            AlertStatus::Resolved,
            AlertStatus::Dismissed,
            AlertStatus::FalsePositive,
        ] {
            for target in [
                AlertStatus::Unread,
                AlertStatus::Read,
                AlertStatus::Acknowledged,
                AlertStatus::Resolved,
                AlertStatus::Dismissed,
                AlertStatus::Active,
                AlertStatus::Investigating,
                AlertStatus::FalsePositive,
            ] {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn self_transition_is_illegal() {
        let mut a = dashboard_alert();
        let err = apply_transition(&mut a, AlertStatus::Unread, None, t1()).unwrap_err();
        assert!(matches!(err, AlertError::IllegalTransition { .. }));
    }

    #[test]
    fn created_at_never_changes() {
        let mut a = fraud_alert();
        let created = a.created_at;
        apply_transition(&mut a, AlertStatus::Investigating, None, t1()).unwrap();
        apply_transition(&mut a, AlertStatus::Resolved, None, t1()).unwrap();
        assert_eq!(a.created_at, created);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_value(AlertStatus::FalsePositive).unwrap();
        assert_eq!(json, serde_json::Value::String("false_positive".into()));
    }
}
