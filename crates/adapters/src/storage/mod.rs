pub mod redb_alert_store;
