//! Shared in-memory fakes for tests across the workspace.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use domain::alert::aggregate::{
    BlockedBidTotals, Breakdown, DailyBidStats, Overview, TrendPoint, breakdown, daily_trend,
    overview,
};
use domain::alert::entity::{Alert, AlertFamily};
use domain::alert::error::AlertError;
use domain::alert::query::AlertFilter;
use domain::alert::status::{AlertStatus, apply_transition};
use domain::common::entity::{AlertId, CampaignId, OwnerId};

use crate::secondary::alert_store::AlertStore;
use crate::secondary::bid_stats::BidStats;
use crate::secondary::campaign_directory::CampaignDirectory;
use crate::secondary::metrics_port::EngineMetrics;

/// Fully functional in-memory `AlertStore` backed by a locked map.
#[derive(Default)]
pub struct MemoryAlertStore {
    alerts: Mutex<HashMap<AlertId, Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn scan<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&HashMap<AlertId, Alert>) -> T,
    {
        let alerts = self.alerts.lock().expect("alert map lock poisoned");
        f(&alerts)
    }

    fn windowed(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Vec<Alert> {
        self.scan(|alerts| {
            alerts
                .values()
                .filter(|a| a.owner_id == owner && a.family() == family && a.created_at >= since)
                .cloned()
                .collect()
        })
    }
}

impl AlertStore for MemoryAlertStore {
    fn insert(&self, alert: &Alert) -> Result<(), AlertError> {
        let mut alerts = self.alerts.lock().expect("alert map lock poisoned");
        alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    fn get(&self, id: AlertId, owner: OwnerId) -> Result<Option<Alert>, AlertError> {
        Ok(self.scan(|alerts| alerts.get(&id).filter(|a| a.owner_id == owner).cloned()))
    }

    fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AlertError> {
        let mut matched: Vec<Alert> = self.scan(|alerts| {
            alerts
                .values()
                .filter(|a| filter.matches(a))
                .cloned()
                .collect()
        });
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len();
        let start = filter.offset.min(total);
        let end = (start + filter.limit).min(total);
        Ok(matched.drain(start..end).collect())
    }

    fn update_status(
        &self,
        id: AlertId,
        owner: OwnerId,
        target: AlertStatus,
        notes: Option<&str>,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Alert, AlertError> {
        let mut alerts = self.alerts.lock().expect("alert map lock poisoned");
        let alert = alerts
            .get_mut(&id)
            .filter(|a| a.owner_id == owner)
            .ok_or(AlertError::NotFound)?;
        if let Some(expected) = expected_version
            && expected != alert.version
        {
            return Err(AlertError::Conflict {
                expected,
                actual: alert.version,
            });
        }
        apply_transition(alert, target, notes, now)?;
        Ok(alert.clone())
    }

    fn bulk_update_status(
        &self,
        ids: &[AlertId],
        owner: OwnerId,
        target: AlertStatus,
        now: DateTime<Utc>,
    ) -> Result<u64, AlertError> {
        let mut alerts = self.alerts.lock().expect("alert map lock poisoned");
        let mut updated = 0;
        for id in ids {
            if let Some(alert) = alerts.get_mut(id).filter(|a| a.owner_id == owner)
                && apply_transition(alert, target, None, now).is_ok()
            {
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn aggregate_overview(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Overview, AlertError> {
        Ok(overview(self.windowed(owner, family, since).iter()))
    }

    fn aggregate_breakdown(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Breakdown, AlertError> {
        Ok(breakdown(self.windowed(owner, family, since).iter()))
    }

    fn aggregate_daily_trend(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, AlertError> {
        Ok(daily_trend(self.windowed(owner, family, since).iter()))
    }

    fn campaign_attempts(
        &self,
        owner: OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<(CampaignId, u64)>, AlertError> {
        let mut counts: HashMap<CampaignId, u64> = HashMap::new();
        for alert in self.windowed(owner, AlertFamily::Fraud, since) {
            if let Some(campaign) = alert.campaign {
                *counts.entry(campaign).or_default() += 1;
            }
        }
        let mut out: Vec<(CampaignId, u64)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(out)
    }
}

/// Campaign directory over a fixed in-memory map.
#[derive(Default)]
pub struct StaticCampaignDirectory {
    entries: Mutex<HashMap<CampaignId, (OwnerId, String)>>,
}

impl StaticCampaignDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, campaign: CampaignId, owner: OwnerId, name: &str) {
        self.entries
            .lock()
            .expect("directory lock poisoned")
            .insert(campaign, (owner, name.to_string()));
    }
}

impl CampaignDirectory for StaticCampaignDirectory {
    fn owner_of(&self, campaign: CampaignId) -> Result<Option<OwnerId>, AlertError> {
        Ok(self
            .entries
            .lock()
            .expect("directory lock poisoned")
            .get(&campaign)
            .map(|(owner, _)| *owner))
    }

    fn name_of(&self, campaign: CampaignId) -> Result<Option<String>, AlertError> {
        Ok(self
            .entries
            .lock()
            .expect("directory lock poisoned")
            .get(&campaign)
            .map(|(_, name)| name.clone()))
    }
}

/// Bid-evaluation fake reporting no fraud-flagged bids.
pub struct NoopBidStats;

impl BidStats for NoopBidStats {
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

/// Metrics sink that discards everything.
pub struct NoopMetrics;

impl EngineMetrics for NoopMetrics {
    fn record_alert_created(&self, _family: &str, _type_label: &str, _severity: &str) {}
    fn record_status_transition(&self, _family: &str, _status: &str) {}
    fn record_bulk_update(&self, _rows: u64) {}
    fn record_query_timeout(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain::alert::entity::{AlertCategory, Severity};
    use domain::common::entity::SeverityLevel;
    use serde_json::Map;

    fn owner() -> OwnerId {
        OwnerId(uuid::Uuid::from_u128(1))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn memory_store_roundtrip_and_scoping() {
        let store = MemoryAlertStore::new();
        let alert = Alert::dashboard(
            owner(),
            AlertCategory::System,
            SeverityLevel::Low,
            "t",
            "m",
            None,
            Map::new(),
            t0(),
        );
        store.insert(&alert).unwrap();

        assert!(store.get(alert.id, owner()).unwrap().is_some());
        let other = OwnerId(uuid::Uuid::from_u128(2));
        assert!(store.get(alert.id, other).unwrap().is_none());
    }

    #[test]
    fn memory_store_bulk_skips_foreign_and_illegal() {
        let store = MemoryAlertStore::new();
        let mine = Alert::dashboard(
            owner(),
            AlertCategory::System,
            SeverityLevel::Low,
            "t",
            "m",
            None,
            Map::new(),
            t0(),
        );
        let foreign = Alert::dashboard(
            OwnerId(uuid::Uuid::from_u128(2)),
            AlertCategory::System,
            SeverityLevel::Low,
            "t",
            "m",
            None,
            Map::new(),
            t0(),
        );
        let fraud = Alert::fraud(
            owner(),
            CampaignId(uuid::Uuid::from_u128(3)),
            "ip_anomaly",
            Severity::score(5).unwrap(),
            "d",
            vec![],
            t0(),
        );
        for a in [&mine, &foreign, &fraud] {
            store.insert(a).unwrap();
        }

        let updated = store
            .bulk_update_status(
                &[mine.id, foreign.id, fraud.id],
                owner(),
                AlertStatus::Read,
                t0(),
            )
            .unwrap();
        // foreign is skipped (not owned), fraud is skipped (family mismatch)
        assert_eq!(updated, 1);
    }
}
