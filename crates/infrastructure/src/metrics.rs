use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use ports::secondary::metrics_port::EngineMetrics;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct AlertCreatedLabels {
    pub family: String,
    pub alert_type: String,
    pub severity: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TransitionLabels {
    pub family: String,
    pub status: String,
}

/// Prometheus metrics registry for the alert engine.
///
/// All metric families use interior mutability (atomics), so recording
/// only requires `&self`. The registry itself is NOT Clone — wrap in
/// `Arc` for multi-task sharing.
pub struct ServerMetrics {
    registry: Registry,
    pub alerts_created_total: Family<AlertCreatedLabels, Counter>,
    pub status_transitions_total: Family<TransitionLabels, Counter>,
    pub bulk_updates_total: Counter,
    pub bulk_rows_updated_total: Counter,
    pub query_timeouts_total: Counter,
}

impl ServerMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("bidwatch");

        let alerts_created_total = Family::<AlertCreatedLabels, Counter>::default();
        registry.register(
            "alerts_created",
            "Alerts materialized, by family/type/severity",
            alerts_created_total.clone(),
        );

        let status_transitions_total = Family::<TransitionLabels, Counter>::default();
        registry.register(
            "status_transitions",
            "Committed single-alert status transitions",
            status_transitions_total.clone(),
        );

        let bulk_updates_total = Counter::default();
        registry.register(
            "bulk_updates",
            "Bulk status transition batches committed",
            bulk_updates_total.clone(),
        );

        let bulk_rows_updated_total = Counter::default();
        registry.register(
            "bulk_rows_updated",
            "Alerts mutated across all bulk batches",
            bulk_rows_updated_total.clone(),
        );

        let query_timeouts_total = Counter::default();
        registry.register(
            "query_timeouts",
            "Read operations that hit their deadline",
            query_timeouts_total.clone(),
        );

        Self {
            registry,
            alerts_created_total,
            status_transitions_total,
            bulk_updates_total,
            bulk_rows_updated_total,
            query_timeouts_total,
        }
    }

    /// Encode the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        prometheus_client::encoding::text::encode(&mut out, &self.registry)?;
        Ok(out)
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics for ServerMetrics {
    fn record_alert_created(&self, family: &str, type_label: &str, severity: &str) {
        self.alerts_created_total
            .get_or_create(&AlertCreatedLabels {
                family: family.to_string(),
                alert_type: type_label.to_string(),
                severity: severity.to_string(),
            })
            .inc();
    }

    fn record_status_transition(&self, family: &str, status: &str) {
        self.status_transitions_total
            .get_or_create(&TransitionLabels {
                family: family.to_string(),
                status: status.to_string(),
            })
            .inc();
    }

    fn record_bulk_update(&self, rows: u64) {
        self.bulk_updates_total.inc();
        self.bulk_rows_updated_total.inc_by(rows);
    }

    fn record_query_timeout(&self) {
        self.query_timeouts_total.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = ServerMetrics::new();
        metrics.record_alert_created("fraud", "click_velocity", "9");
        metrics.record_status_transition("dashboard", "read");
        metrics.record_bulk_update(7);
        metrics.record_query_timeout();

        let text = metrics.encode().unwrap();
        assert!(text.contains("bidwatch_alerts_created_total"));
        assert!(text.contains("click_velocity"));
        assert!(text.contains("bidwatch_bulk_rows_updated_total 7"));
        assert!(text.contains("bidwatch_query_timeouts_total 1"));
    }

    #[test]
    fn bulk_rows_accumulate() {
        let metrics = ServerMetrics::new();
        metrics.record_bulk_update(3);
        metrics.record_bulk_update(4);
        let text = metrics.encode().unwrap();
        assert!(text.contains("bidwatch_bulk_updates_total 2"));
        assert!(text.contains("bidwatch_bulk_rows_updated_total 7"));
    }
}
