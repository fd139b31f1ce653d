//! Server configuration: structs, YAML parsing, and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use domain::common::entity::{CampaignId, OwnerId};

use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_DB_PATH, DEFAULT_HTTP_PORT, DEFAULT_QUERY_TIMEOUT_SECS,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Self::Yaml(e.to_string())
    }
}

// ── Shared serde defaults ──────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_HTTP_PORT
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_query_timeout() -> u64 {
    DEFAULT_QUERY_TIMEOUT_SECS
}

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Statically provisioned campaign directory entries.
    #[serde(default)]
    pub campaigns: Vec<CampaignEntry>,
}

impl ServerConfig {
    /// Load config from a YAML file.
    ///
    /// On Unix, logs a warning if the file is world-readable, since it
    /// may contain the JWT secret.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        warn_if_world_readable(path, "config file");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.query_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "engine.query_timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.auth.enabled && self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Validation {
                field: "auth.jwt_secret".to_string(),
                message: "auth is enabled but no jwt_secret is set".to_string(),
            });
        }
        for (idx, entry) in self.campaigns.iter().enumerate() {
            entry.validate(idx)?;
        }
        Ok(())
    }

    /// Resolved campaign directory entries (validated IDs).
    pub fn campaign_entries(&self) -> Vec<(CampaignId, OwnerId, String)> {
        self.campaigns
            .iter()
            .filter_map(|entry| {
                let campaign = Uuid::parse_str(&entry.id).ok().map(CampaignId)?;
                let owner = Uuid::parse_str(&entry.owner_id).ok().map(OwnerId)?;
                Some((campaign, owner, entry.name.clone()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Serve the interactive API docs at /swagger-ui.
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            swagger_ui: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the redb alert database.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Deadline for read operations (filter queries, aggregation).
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: default_query_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// When disabled, the API accepts an `X-Owner-Id` header instead
    /// of a bearer token (development mode only).
    #[serde(default)]
    pub enabled: bool,

    /// HS256 shared secret for bearer-token validation.
    #[serde(default)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CampaignEntry {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
}

impl CampaignEntry {
    fn validate(&self, idx: usize) -> Result<(), ConfigError> {
        if Uuid::parse_str(&self.id).is_err() {
            return Err(ConfigError::Validation {
                field: format!("campaigns[{idx}].id"),
                message: format!("'{}' is not a UUID", self.id),
            });
        }
        if Uuid::parse_str(&self.owner_id).is_err() {
            return Err(ConfigError::Validation {
                field: format!("campaigns[{idx}].owner_id"),
                message: format!("'{}' is not a UUID", self.owner_id),
            });
        }
        Ok(())
    }
}

// ── Logging ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Flattened JSON for log aggregators (production).
    #[default]
    Json,
    /// Human-readable colored output (development).
    Text,
}

/// Warn when a sensitive file is readable by group or world.
#[cfg(unix)]
fn warn_if_world_readable(path: &Path, what: &str) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode() & 0o777;
        if mode & 0o037 != 0 {
            warn!(path = %path.display(), mode = format!("{mode:o}"), "{what} is world-readable");
        }
    }
}

#[cfg(not(unix))]
fn warn_if_world_readable(_path: &Path, _what: &str) {}
