/// Default REST API port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/bidwatch/config.yaml";

/// Default alert database location.
pub const DEFAULT_DB_PATH: &str = "/var/lib/bidwatch/alerts.redb";

/// Default deadline for read operations (seconds).
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
