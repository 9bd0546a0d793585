use crate::logging::LogFormat;

/// Default interface the API server listens on.
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

/// Default TCP port for the API server.
pub const DEFAULT_LISTEN_PORT: u16 = 8443;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Seconds the server waits for in-flight requests after a shutdown signal.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Upper bound on buffered request bodies (1 MiB).
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Owned listen host used where allocation is required (e.g. serde).
pub fn default_listen_host() -> String {
    DEFAULT_LISTEN_HOST.to_string()
}

/// Default log filter expression used by the server.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
