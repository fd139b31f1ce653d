use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};

use domain::alert::aggregate::{Breakdown, Overview, TrendPoint, breakdown, daily_trend, overview};
use domain::alert::entity::{Alert, AlertFamily};
use domain::alert::error::AlertError;
use domain::alert::query::AlertFilter;
use domain::alert::status::{AlertStatus, apply_transition};
use domain::common::entity::{AlertId, CampaignId, OwnerId};
use ports::secondary::alert_store::AlertStore;

/// redb table: key = alert ID (UUID string), value = JSON-serialized `Alert`.
const ALERT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("alerts");

/// Persistent alert store backed by redb.
///
/// Alerts are keyed by their unique ID and retained indefinitely —
/// terminal states stay queryable for audit and trend history.
/// Mutations run inside a single write transaction each, serialized by
/// `write_lock`, so a status update or a whole bulk batch commits
/// atomically or not at all.
pub struct RedbAlertStore {
    db: Database,
    /// Serialize writers so read-modify-write cycles stay atomic.
    write_lock: Mutex<()>,
}

impl RedbAlertStore {
    /// Open (or create) a redb database at `path`.
    pub fn open(path: &Path) -> Result<Self, AlertError> {
        let db = Database::create(path)
            .map_err(|e| AlertError::StoreFailed(format!("redb open failed: {e}")))?;

        // Ensure the table exists.
        let txn = db
            .begin_write()
            .map_err(|e| AlertError::StoreFailed(format!("redb txn begin: {e}")))?;
        {
            let _table = txn
                .open_table(ALERT_TABLE)
                .map_err(|e| AlertError::StoreFailed(format!("redb table create: {e}")))?;
        }
        txn.commit()
            .map_err(|e| AlertError::StoreFailed(format!("redb commit: {e}")))?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    /// Scan all alerts matching a predicate.
    fn scan<F>(&self, mut keep: F) -> Result<Vec<Alert>, AlertError>
    where
        F: FnMut(&Alert) -> bool,
    {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| AlertError::QueryFailed(format!("redb read txn: {e}")))?;
        let table = txn
            .open_table(ALERT_TABLE)
            .map_err(|e| AlertError::QueryFailed(format!("redb read table: {e}")))?;

        let alerts = table
            .iter()
            .map_err(|e| AlertError::QueryFailed(format!("redb iter: {e}")))?
            .filter_map(Result::ok)
            .filter_map(|(_k, v)| serde_json::from_slice::<Alert>(v.value()).ok())
            .filter(|a| keep(a))
            .collect();
        Ok(alerts)
    }

    /// Scan one owner's alerts of one family detected at or after `since`.
    fn scan_window(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Vec<Alert>, AlertError> {
        self.scan(|a| a.owner_id == owner && a.family() == family && a.created_at >= since)
    }
}

impl AlertStore for RedbAlertStore {
    fn insert(&self, alert: &Alert) -> Result<(), AlertError> {
        let _lock = self
            .write_lock
            .lock()
            .map_err(|e| AlertError::StoreFailed(format!("lock poisoned: {e}")))?;

        let key = alert.id.to_string();
        let value = serde_json::to_vec(alert)
            .map_err(|e| AlertError::StoreFailed(format!("serialize: {e}")))?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| AlertError::StoreFailed(format!("redb write txn: {e}")))?;
        {
            let mut table = txn
                .open_table(ALERT_TABLE)
                .map_err(|e| AlertError::StoreFailed(format!("redb write table: {e}")))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(|e| AlertError::StoreFailed(format!("redb insert: {e}")))?;
        }
        txn.commit()
            .map_err(|e| AlertError::StoreFailed(format!("redb write commit: {e}")))?;

        Ok(())
    }

    fn get(&self, id: AlertId, owner: OwnerId) -> Result<Option<Alert>, AlertError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| AlertError::QueryFailed(format!("redb read txn: {e}")))?;
        let table = txn
            .open_table(ALERT_TABLE)
            .map_err(|e| AlertError::QueryFailed(format!("redb read table: {e}")))?;

        let key = id.to_string();
        let result = table
            .get(key.as_str())
            .map_err(|e| AlertError::QueryFailed(format!("redb get: {e}")))?;

        match result {
            Some(guard) => {
                let alert: Alert = serde_json::from_slice(guard.value())
                    .map_err(|e| AlertError::QueryFailed(format!("deserialize: {e}")))?;
                Ok(Some(alert).filter(|a| a.owner_id == owner))
            }
            None => Ok(None),
        }
    }

    fn query(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AlertError> {
        let mut alerts = self.scan(|a| filter.matches(a))?;

        // Newest detected first.
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = alerts.len();
        let start = filter.offset.min(total);
        let end = (start + filter.limit).min(total);
        Ok(alerts.drain(start..end).collect())
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
        let _lock = self
            .write_lock
            .lock()
            .map_err(|e| AlertError::StoreFailed(format!("lock poisoned: {e}")))?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| AlertError::StoreFailed(format!("redb write txn: {e}")))?;
        let updated = {
            let mut table = txn
                .open_table(ALERT_TABLE)
                .map_err(|e| AlertError::StoreFailed(format!("redb write table: {e}")))?;

            let key = id.to_string();
            let mut alert: Alert = {
                let existing = table
                    .get(key.as_str())
                    .map_err(|e| AlertError::QueryFailed(format!("redb get: {e}")))?;
                match existing {
                    Some(guard) => serde_json::from_slice(guard.value())
                        .map_err(|e| AlertError::QueryFailed(format!("deserialize: {e}")))?,
                    None => return Err(AlertError::NotFound),
                }
            };

            if alert.owner_id != owner {
                return Err(AlertError::NotFound);
            }
            if let Some(expected) = expected_version
                && expected != alert.version
            {
                return Err(AlertError::Conflict {
                    expected,
                    actual: alert.version,
                });
            }

            apply_transition(&mut alert, target, notes, now)?;

            let value = serde_json::to_vec(&alert)
                .map_err(|e| AlertError::StoreFailed(format!("serialize: {e}")))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(|e| AlertError::StoreFailed(format!("redb insert: {e}")))?;
            alert
        };
        txn.commit()
            .map_err(|e| AlertError::StoreFailed(format!("redb write commit: {e}")))?;

        Ok(updated)
    }

    fn bulk_update_status(
        &self,
        ids: &[AlertId],
        owner: OwnerId,
        target: AlertStatus,
        now: DateTime<Utc>,
    ) -> Result<u64, AlertError> {
        let _lock = self
            .write_lock
            .lock()
            .map_err(|e| AlertError::StoreFailed(format!("lock poisoned: {e}")))?;

        // One write transaction for the whole batch: either every
        // eligible alert commits or, on storage failure, none does.
        let txn = self
            .db
            .begin_write()
            .map_err(|e| AlertError::StoreFailed(format!("redb write txn: {e}")))?;
        let mut updated = 0u64;
        {
            let mut table = txn
                .open_table(ALERT_TABLE)
                .map_err(|e| AlertError::StoreFailed(format!("redb write table: {e}")))?;

            for id in ids {
                let key = id.to_string();
                let mut alert: Alert = {
                    let existing = table
                        .get(key.as_str())
                        .map_err(|e| AlertError::QueryFailed(format!("redb get: {e}")))?;
                    match existing {
                        Some(guard) => match serde_json::from_slice(guard.value()) {
                            Ok(alert) => alert,
                            Err(_) => continue,
                        },
                        None => continue,
                    }
                };

                // Owner, family, and edge-legality checks exclude the
                // alert silently; only the mutated count is reported.
                if alert.owner_id != owner {
                    continue;
                }
                if apply_transition(&mut alert, target, None, now).is_err() {
                    continue;
                }

                let value = serde_json::to_vec(&alert)
                    .map_err(|e| AlertError::StoreFailed(format!("serialize: {e}")))?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| AlertError::StoreFailed(format!("redb insert: {e}")))?;
                updated += 1;
            }
        }
        txn.commit()
            .map_err(|e| AlertError::StoreFailed(format!("redb write commit: {e}")))?;

        Ok(updated)
    }

    fn aggregate_overview(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Overview, AlertError> {
        Ok(overview(self.scan_window(owner, family, since)?.iter()))
    }

    fn aggregate_breakdown(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Breakdown, AlertError> {
        Ok(breakdown(self.scan_window(owner, family, since)?.iter()))
    }

    fn aggregate_daily_trend(
        &self,
        owner: OwnerId,
        family: AlertFamily,
        since: DateTime<Utc>,
    ) -> Result<Vec<TrendPoint>, AlertError> {
        Ok(daily_trend(self.scan_window(owner, family, since)?.iter()))
    }

    fn campaign_attempts(
        &self,
        owner: OwnerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<(CampaignId, u64)>, AlertError> {
        let mut counts: std::collections::HashMap<CampaignId, u64> =
            std::collections::HashMap::new();
        for alert in self.scan_window(owner, AlertFamily::Fraud, since)? {
            if let Some(campaign) = alert.campaign {
                *counts.entry(campaign).or_default() += 1;
            }
        }
        let mut out: Vec<(CampaignId, u64)> = counts.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(out)
    }
}
