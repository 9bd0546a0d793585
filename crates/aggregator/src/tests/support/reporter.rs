//! Health reporter that keeps every lifecycle event for later assertions.

use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};

use aggregator_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// One observed lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    /// Carries the address the configuration asked to listen on.
    BootstrapSucceeded { listen: String },
    /// Carries the rendered error.
    BootstrapFailed(String),
    ListenerReady(SocketAddr),
    ShutdownRequested,
    /// Carries whether every connection closed inside the drain window.
    ShutdownCompleted(bool),
}

/// Appends events in arrival order. Shared across threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    log: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The bound address, once the listener reported it.
    pub fn listener_address(&self) -> Option<SocketAddr> {
        self.events().into_iter().find_map(|event| match event {
            HealthEvent::ListenerReady(address) => Some(address),
            _ => None,
        })
    }

    fn push(&self, event: HealthEvent) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.push(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        self.push(HealthEvent::BootstrapSucceeded {
            listen: config.listen_address(),
        });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.push(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, address: SocketAddr) {
        self.push(HealthEvent::ListenerReady(address));
    }

    fn shutdown_requested(&self) {
        self.push(HealthEvent::ShutdownRequested);
    }

    fn shutdown_completed(&self, drained: bool) {
        self.push(HealthEvent::ShutdownCompleted(drained));
    }
}
