pub mod alert_store;
pub mod auth_provider;
pub mod bid_stats;
pub mod campaign_directory;
pub mod metrics_port;
