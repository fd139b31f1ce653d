use std::sync::Arc;
use std::time::Instant;

use application::alert_service_impl::AlertAppService;
use infrastructure::metrics::ServerMetrics;
use ports::secondary::auth_provider::AuthProvider;

/// Shared application state for the REST API server.
///
/// Passed to Axum handlers via `State(Arc<AppState>)`.
pub struct AppState {
    pub alert_service: Arc<AlertAppService>,
    pub metrics: Arc<ServerMetrics>,
    pub auth_provider: Option<Arc<dyn AuthProvider>>,
    pub start_time: Instant,
    pub version: &'static str,
}

impl AppState {
    pub fn new(alert_service: Arc<AlertAppService>, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            alert_service,
            metrics,
            auth_provider: None,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Attach a bearer-token auth provider. Without one, the API runs
    /// in development mode and resolves the owner from `X-Owner-Id`.
    #[must_use]
    pub fn with_auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ports::test_utils::{
        MemoryAlertStore, NoopBidStats, NoopMetrics, StaticCampaignDirectory,
    };

    #[test]
    fn new_creates_valid_state() {
        let service = Arc::new(AlertAppService::new(
            Arc::new(MemoryAlertStore::new()),
            Arc::new(StaticCampaignDirectory::new()),
            Arc::new(NoopBidStats),
            Arc::new(NoopMetrics),
        ));
        let state = AppState::new(service, Arc::new(ServerMetrics::new()));
        assert!(state.auth_provider.is_none());
        assert!(!state.version.is_empty());
    }
}
