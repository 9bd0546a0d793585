//! Shared configuration for the aggregation API server.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! TOML file (`--config-path`), then `AGGREGATOR_*` environment variables, then
//! command-line flags. The resolved [`Config`] only covers process-level
//! concerns (listener, logging, shutdown budget). The API group, version and
//! resource set are supplied in code when the router is built.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT, DEFAULT_LOG_FILTER, DEFAULT_MAX_REQUEST_BYTES,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS, default_listen_host, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "AGGREGATOR")]
pub struct Config {
    /// Interface the HTTP listener binds to.
    #[ortho_config(default = defaults::default_listen_host())]
    pub listen_host: String,
    /// TCP port the HTTP listener binds to. Zero asks the OS for a free port.
    #[ortho_config(default = DEFAULT_LISTEN_PORT)]
    pub listen_port: u16,
    /// `tracing` filter directive, e.g. `info,aggregator::watch=debug`.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the log subscriber.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Bounded wait for in-flight requests once shutdown begins.
    #[ortho_config(default = DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    pub shutdown_timeout_secs: u64,
    /// Largest request body the server buffers before answering 413.
    #[ortho_config(default = DEFAULT_MAX_REQUEST_BYTES)]
    pub max_request_bytes: usize,
}

impl Config {
    /// Host and port joined for socket address resolution.
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Shutdown drain budget.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Request body limit in bytes.
    #[must_use]
    pub fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            listen_port: DEFAULT_LISTEN_PORT,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listen_address_uses_default_port() {
        let config = Config::default();
        assert_eq!(config.listen_address(), "0.0.0.0:8443");
    }

    #[test]
    fn shutdown_timeout_is_expressed_in_seconds() {
        let config = Config {
            shutdown_timeout_secs: 3,
            ..Config::default()
        };
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(3));
    }
}
