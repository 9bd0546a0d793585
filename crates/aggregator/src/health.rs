//! Structured health reporting for server lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use aggregator_config::Config;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the listener accepts connections.
    fn listener_ready(&self, address: SocketAddr);

    /// Invoked when a shutdown signal arrives.
    fn shutdown_requested(&self);

    /// Invoked after the listener stopped. `drained` is false when the drain
    /// window elapsed with connections still open.
    fn shutdown_completed(&self, drained: bool);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, address: SocketAddr) {
        (**self).listener_ready(address);
    }

    fn shutdown_requested(&self) {
        (**self).shutdown_requested();
    }

    fn shutdown_completed(&self, drained: bool) {
        (**self).shutdown_completed(drained);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen_address(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            shutdown_timeout_secs = config.shutdown_timeout_secs,
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn listener_ready(&self, address: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            address = %address,
            "accepting connections"
        );
    }

    fn shutdown_requested(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_requested",
            "shutdown requested"
        );
    }

    fn shutdown_completed(&self, drained: bool) {
        if drained {
            tracing::info!(
                target: HEALTH_TARGET,
                event = "shutdown_completed",
                drained,
                "server stopped"
            );
        } else {
            tracing::warn!(
                target: HEALTH_TARGET,
                event = "shutdown_completed",
                drained,
                "server stopped before all connections drained"
            );
        }
    }
}
