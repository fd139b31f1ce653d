use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use adapters::auth::jwt_provider::JwtAuthProvider;
use adapters::bidstats::unimplemented_store::UnimplementedBidStats;
use adapters::directory::config_directory::ConfigCampaignDirectory;
use adapters::http::server::run_http_server;
use adapters::http::state::AppState;
use adapters::storage::redb_alert_store::RedbAlertStore;
use application::alert_service_impl::AlertAppService;
use infrastructure::config::ServerConfig;
use infrastructure::logging::init_logging;
use infrastructure::metrics::ServerMetrics;
use ports::secondary::auth_provider::AuthProvider;

use crate::cli::Cli;
use crate::shutdown::shutdown_signal;

/// Load config, wire the engine, and serve until shutdown.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = Path::new(&cli.config);
    let mut config = if config_path.exists() {
        ServerConfig::load(config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?
    } else {
        ServerConfig::default()
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let level = cli.log_level.unwrap_or(config.logging.level);
    let format = cli.log_format.unwrap_or(config.logging.format);
    init_logging(level, format).context("initializing logging")?;

    if !config_path.exists() {
        tracing::warn!(
            path = %config_path.display(),
            "config file not found, running with defaults"
        );
    }

    let metrics = Arc::new(ServerMetrics::new());

    let db_path = Path::new(&config.storage.db_path);
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let store = Arc::new(
        RedbAlertStore::open(db_path)
            .with_context(|| format!("opening alert store at {}", db_path.display()))?,
    );
    tracing::info!(path = %db_path.display(), "alert store ready");

    let directory = Arc::new(ConfigCampaignDirectory::new(config.campaign_entries()));
    if directory.is_empty() {
        tracing::warn!("no campaigns configured, fraud alert creation will find no owners");
    } else {
        tracing::info!(campaigns = directory.len(), "campaign directory loaded");
    }

    let service = Arc::new(
        AlertAppService::new(
            store,
            directory,
            Arc::new(UnimplementedBidStats),
            Arc::clone(&metrics) as _,
        )
        .with_query_timeout(Duration::from_secs(config.engine.query_timeout_secs)),
    );

    let mut state = AppState::new(service, metrics);
    if config.auth.enabled {
        let provider = JwtAuthProvider::new(config.auth.jwt_secret.as_bytes())
            .context("constructing JWT auth provider")?;
        state = state.with_auth_provider(Arc::new(provider) as Arc<dyn AuthProvider>);
        tracing::info!("bearer-token auth enabled");
    } else {
        tracing::warn!("auth disabled, owner identity comes from X-Owner-Id (development mode)");
    }

    run_http_server(
        Arc::new(state),
        &config.server.bind_address,
        config.server.port,
        config.server.swagger_ui,
        shutdown_signal(),
    )
    .await
}
