//! Dispatch core for a Kubernetes-style aggregation API server.
//!
//! A caller describes the resources of one API group/version with
//! [`ResourceDescriptor`]s, binds each to a backing [`ResourceStore`] or to
//! its own handlers, and freezes them into a [`Router`] with
//! [`RouterBuilder`]. The router then answers:
//!
//! - discovery documents and the `/healthz` and `/readyz` probes;
//! - Get and List, with label and field selectors and list transform hooks;
//! - Watch, as a newline-delimited JSON event stream whose backing
//!   subscription is released exactly once on every exit path;
//! - custom verbs and raw endpoints handed straight to caller code.
//!
//! The server never authenticates, persists or mutates anything itself. Writes
//! exist only through custom handlers.
//!
//! [`run_server`] wires a router to configuration from
//! [`aggregator_config`], structured telemetry and an HTTP/1.1 listener with a
//! bounded graceful drain.

mod bootstrap;
pub mod dispatch;
mod health;
pub mod query;
pub mod resource;
mod server;
mod shutdown;
pub mod store;
mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod transport;
pub mod watch;

pub use aggregator_config::{Config, LogFormat};
pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use dispatch::{ApiService, RequestContext, Router, RouterBuilder, RouterError};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use resource::{
    CustomHandlerSet, CustomVerb, RawEndpoints, ResourceBinding, ResourceDescriptor,
    StructuredBinding,
};
pub use server::{ServeError, ServePlan, run_server, run_server_with};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use store::{KindResolver, ResourceStore, StaticKindResolver, StoreError, Subscription};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

#[cfg(test)]
mod tests;
