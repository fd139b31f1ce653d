use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::common::entity::{CampaignId, SeverityLevel};

use super::entity::Alert;

/// Trailing aggregation window in days, validated to `[1, 365]`.
/// Out-of-range or omitted values fall back to the 30-day default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingWindow {
    days: i64,
}

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 365;

impl TrailingWindow {
    pub fn new(days: Option<i64>) -> Self {
        let days = match days {
            Some(d) if (1..=MAX_WINDOW_DAYS).contains(&d) => d,
            _ => DEFAULT_WINDOW_DAYS,
        };
        Self { days }
    }

    pub fn days(self) -> i64 {
        self.days
    }

    /// Inclusive lower bound of the window ending at `now`.
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days)
    }
}

impl Default for TrailingWindow {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Point-in-time counts over one family's window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub total: u64,
    /// Alerts still awaiting operator attention (`unread` / `active`).
    pub unactioned: u64,
    /// Alerts at the top of their severity scale (`critical` / score ≥ 8).
    pub top_severity: u64,
}

/// Fold an alert stream into overview counts.
pub fn overview<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Overview {
    let mut out = Overview::default();
    for alert in alerts {
        out.total += 1;
        if alert.is_unactioned() {
            out.unactioned += 1;
        }
        if alert.is_top_severity() {
            out.top_severity += 1;
        }
    }
    out
}

/// Grouped counts keyed by label; only labels with at least one
/// occurrence appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    /// Category for dashboard alerts, detector label for fraud alerts.
    pub by_type: BTreeMap<String, u64>,
    pub by_severity: BTreeMap<String, u64>,
}

pub fn breakdown<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Breakdown {
    let mut out = Breakdown::default();
    for alert in alerts {
        *out.by_type.entry(alert.type_label().to_string()).or_default() += 1;
        *out.by_severity.entry(alert.severity.label()).or_default() += 1;
    }
    out
}

/// One day-bucket of a trend series. `blocked_bids` and `amount_saved`
/// are zero for dashboard alerts and merged in from the bid-evaluation
/// collaborator for fraud alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub detections: u64,
    pub blocked_bids: u64,
    pub amount_saved: f64,
}

/// Bucket alerts by detection day, newest day first. Days with no
/// alerts are absent — consumers must treat missing days as zero.
pub fn daily_trend<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for alert in alerts {
        *buckets.entry(alert.detected_on()).or_default() += 1;
    }
    buckets
        .into_iter()
        .rev()
        .map(|(date, detections)| TrendPoint {
            date,
            detections,
            blocked_bids: 0,
            amount_saved: 0.0,
        })
        .collect()
}

/// Per-day fraud-flagged bid figures from the bid-evaluation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBidStats {
    pub date: NaiveDate,
    pub blocked_bids: u64,
    pub amount_saved: f64,
}

/// Window totals of fraud-flagged bid activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BlockedBidTotals {
    pub blocked_bids: u64,
    pub amount_saved: f64,
}

/// Merge per-day bid stats into an existing trend series by date.
/// Days present only in the bid stats are ignored — the trend axis is
/// the set of days with detections.
pub fn merge_bid_stats(trend: &mut [TrendPoint], stats: &[DailyBidStats]) {
    for point in trend {
        if let Some(day) = stats.iter().find(|s| s.date == point.date) {
            point.blocked_bids = day.blocked_bids;
            point.amount_saved = day.amount_saved;
        }
    }
}

/// Device-dimension fraud breakdown row (bid-evaluation collaborator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFraudRow {
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub total_bids: u64,
    pub fraud_bids: u64,
    pub fraud_rate: f64,
}

/// Geographic fraud breakdown row (bid-evaluation collaborator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFraudRow {
    pub country: String,
    pub region: String,
    pub city: String,
    pub total_bids: u64,
    pub fraud_bids: u64,
    pub fraud_rate: f64,
}

/// Derive the overall threat level from the count of active fraud
/// alerts in the window.
pub fn threat_level(active_alerts: u64) -> SeverityLevel {
    if active_alerts > 10 {
        SeverityLevel::Critical
    } else if active_alerts > 5 {
        SeverityLevel::High
    } else if active_alerts > 2 {
        SeverityLevel::Medium
    } else {
        SeverityLevel::Low
    }
}

/// Fraud risk summary for one campaign in the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignRisk {
    pub campaign: CampaignId,
    pub campaign_name: String,
    pub fraud_attempts: u64,
    pub risk_score: f64,
    pub threat_level: SeverityLevel,
}

impl CampaignRisk {
    /// Score a campaign from its fraud-alert count.
    pub fn from_attempts(campaign: CampaignId, campaign_name: String, attempts: u64) -> Self {
        let risk_score = if attempts > 10 {
            9.0
        } else if attempts > 5 {
            7.0
        } else if attempts > 2 {
            5.0
        } else {
            3.0
        };
        let threat_level = if risk_score >= 8.0 {
            SeverityLevel::Critical
        } else if risk_score >= 6.0 {
            SeverityLevel::High
        } else if risk_score >= 4.0 {
            SeverityLevel::Medium
        } else {
            SeverityLevel::Low
        };
        Self {
            campaign,
            campaign_name,
            fraud_attempts: attempts,
            risk_score,
            threat_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::entity::{AlertCategory, Severity};
    use crate::alert::status::{AlertStatus, apply_transition};
    use crate::common::entity::OwnerId;
    use chrono::TimeZone;
    use serde_json::Map;

    fn owner() -> OwnerId {
        OwnerId(uuid::Uuid::from_u128(1))
    }

    fn on_day(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 9, 30, 0).unwrap()
    }

    fn dashboard(level: SeverityLevel, day: u32) -> Alert {
        Alert::dashboard(
            owner(),
            AlertCategory::Performance,
            level,
            "t",
            "m",
            None,
            Map::new(),
            on_day(day),
        )
    }

    fn fraud(detection: &str, score: u8, day: u32) -> Alert {
        Alert::fraud(
            owner(),
            CampaignId(uuid::Uuid::from_u128(7)),
            detection,
            Severity::score(score).unwrap(),
            "d",
            vec![],
            on_day(day),
        )
    }

    #[test]
    fn window_validation() {
        assert_eq!(TrailingWindow::new(None).days(), 30);
        assert_eq!(TrailingWindow::new(Some(0)).days(), 30);
        assert_eq!(TrailingWindow::new(Some(-3)).days(), 30);
        assert_eq!(TrailingWindow::new(Some(366)).days(), 30);
        assert_eq!(TrailingWindow::new(Some(7)).days(), 7);
        assert_eq!(TrailingWindow::new(Some(365)).days(), 365);
    }

    #[test]
    fn window_start_is_days_back() {
        let now = on_day(20);
        let start = TrailingWindow::new(Some(7)).start(now);
        assert_eq!(start, on_day(13));
    }

    #[test]
    fn overview_counts_fixture() {
        // 10 alerts, 3 unactioned, 2 at top severity
        let mut alerts: Vec<Alert> = Vec::new();
        alerts.push(dashboard(SeverityLevel::Critical, 1)); // unactioned + top
        alerts.push(fraud("ip_anomaly", 9, 2)); // unactioned + top
        alerts.push(dashboard(SeverityLevel::Low, 3)); // unactioned
        for i in 0..7 {
            let mut a = dashboard(SeverityLevel::Medium, 4 + i);
            apply_transition(&mut a, AlertStatus::Read, None, on_day(12)).unwrap();
            alerts.push(a);
        }
        let o = overview(alerts.iter());
        assert_eq!(o.total, 10);
        assert_eq!(o.unactioned, 3);
        assert_eq!(o.top_severity, 2);
    }

    #[test]
    fn overview_empty_is_zero() {
        assert_eq!(overview(std::iter::empty()), Overview::default());
    }

    #[test]
    fn breakdown_only_occurring_labels() {
        let alerts = vec![
            dashboard(SeverityLevel::High, 1),
            dashboard(SeverityLevel::High, 2),
            fraud("click_velocity", 9, 3),
        ];
        let b = breakdown(alerts.iter());
        assert_eq!(b.by_type.get("performance"), Some(&2));
        assert_eq!(b.by_type.get("click_velocity"), Some(&1));
        assert!(!b.by_type.contains_key("budget"));
        assert_eq!(b.by_severity.get("high"), Some(&2));
        assert_eq!(b.by_severity.get("9"), Some(&1));
    }

    #[test]
    fn daily_trend_omits_empty_days_newest_first() {
        // alerts on 3 distinct days out of 7
        let alerts = vec![
            fraud("ip_anomaly", 4, 10),
            fraud("ip_anomaly", 4, 10),
            fraud("geo_anomaly", 5, 12),
            fraud("bot_detection", 6, 14),
        ];
        let trend = daily_trend(alerts.iter());
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].date, on_day(14).date_naive());
        assert_eq!(trend[0].detections, 1);
        assert_eq!(trend[1].date, on_day(12).date_naive());
        assert_eq!(trend[2].date, on_day(10).date_naive());
        assert_eq!(trend[2].detections, 2);
    }

    #[test]
    fn merge_bid_stats_by_date() {
        let alerts = vec![fraud("ip_anomaly", 4, 10), fraud("geo_anomaly", 5, 12)];
        let mut trend = daily_trend(alerts.iter());
        let stats = vec![
            DailyBidStats {
                date: on_day(10).date_naive(),
                blocked_bids: 42,
                amount_saved: 13.5,
            },
            // day without detections: ignored
            DailyBidStats {
                date: on_day(11).date_naive(),
                blocked_bids: 7,
                amount_saved: 1.0,
            },
        ];
        merge_bid_stats(&mut trend, &stats);
        assert_eq!(trend.len(), 2);
        let day10 = trend.iter().find(|p| p.date == on_day(10).date_naive());
        assert_eq!(day10.unwrap().blocked_bids, 42);
        let day12 = trend.iter().find(|p| p.date == on_day(12).date_naive());
        assert_eq!(day12.unwrap().blocked_bids, 0);
    }

    #[test]
    fn threat_level_thresholds() {
        assert_eq!(threat_level(0), SeverityLevel::Low);
        assert_eq!(threat_level(2), SeverityLevel::Low);
        assert_eq!(threat_level(3), SeverityLevel::Medium);
        assert_eq!(threat_level(6), SeverityLevel::High);
        assert_eq!(threat_level(11), SeverityLevel::Critical);
    }

    #[test]
    fn campaign_risk_scoring() {
        let id = CampaignId(uuid::Uuid::from_u128(7));
        let low = CampaignRisk::from_attempts(id, "a".into(), 1);
        assert!((low.risk_score - 3.0).abs() < f64::EPSILON);
        assert_eq!(low.threat_level, SeverityLevel::Low);

        let medium = CampaignRisk::from_attempts(id, "b".into(), 4);
        assert!((medium.risk_score - 5.0).abs() < f64::EPSILON);
        assert_eq!(medium.threat_level, SeverityLevel::Medium);

        let high = CampaignRisk::from_attempts(id, "c".into(), 8);
        assert!((high.risk_score - 7.0).abs() < f64::EPSILON);
        assert_eq!(high.threat_level, SeverityLevel::High);

        let critical = CampaignRisk::from_attempts(id, "d".into(), 20);
        assert!((critical.risk_score - 9.0).abs() < f64::EPSILON);
        assert_eq!(critical.threat_level, SeverityLevel::Critical);
    }
}
