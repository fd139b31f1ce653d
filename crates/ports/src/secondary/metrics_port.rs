/// Engine-side metrics facade so application code does not depend on a
/// concrete metrics backend.
pub trait EngineMetrics: Send + Sync {
    /// An alert was materialized.
    fn record_alert_created(&self, family: &str, type_label: &str, severity: &str);

    /// A single-alert status transition committed.
    fn record_status_transition(&self, family: &str, status: &str);

    /// A bulk transition committed, mutating `rows` alerts.
    fn record_bulk_update(&self, rows: u64);

    /// A read operation hit its deadline.
    fn record_query_timeout(&self);
}
