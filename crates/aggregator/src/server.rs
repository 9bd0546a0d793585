//! Server lifecycle: bootstrap, bind, serve, drain.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::{ApiService, Router};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
use crate::transport::{HttpListener, ListenerError};

pub(crate) const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Configuration or telemetry could not be set up.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The listener could not be bound.
    #[error("failed to start listener: {0}")]
    Listener(#[from] ListenerError),
    /// The shutdown signal could not be awaited.
    #[error("failed to wait for shutdown: {0}")]
    Signal(#[from] ShutdownError),
    /// The accept loop task failed.
    #[error("listener task failed: {0}")]
    Task(#[from] JoinError),
}

/// Collaborators for one server run.
pub struct ServePlan<L, S> {
    /// Supplies the configuration.
    pub loader: L,
    /// Observes lifecycle events.
    pub reporter: Arc<dyn HealthReporter>,
    /// Resolves when the server should stop.
    pub shutdown: S,
}

/// Runs `router` with configuration from defaults, file, environment and
/// flags, until `SIGINT` or `SIGTERM`.
///
/// # Errors
///
/// Returns [`ServeError`] when bootstrap, binding or signal handling fails.
pub async fn run_server(router: Router) -> Result<(), ServeError> {
    let plan = ServePlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
    };
    run_server_with(router, plan).await
}

/// Runs `router` with injected collaborators.
///
/// Shutdown cancels every in-flight request, including open watches, then
/// waits up to the configured timeout for connections to close.
///
/// # Errors
///
/// Returns [`ServeError`] when bootstrap, binding or signal handling fails.
pub async fn run_server_with<L, S>(router: Router, plan: ServePlan<L, S>) -> Result<(), ServeError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let ServePlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    let config = bootstrap_with(&loader, reporter.as_ref())?.into_config();
    let listener = HttpListener::bind(&config.listen_host, config.listen_port).await?;
    info!(
        target: SERVER_TARGET,
        prefix = router.prefix(),
        address = %listener.local_addr(),
        "serving aggregated API"
    );
    reporter.listener_ready(listener.local_addr());

    let stop = CancellationToken::new();
    let service = ApiService::new(router, stop.clone(), config.max_request_bytes());
    let serving = tokio::spawn(listener.serve(
        service,
        stop.clone(),
        config.shutdown_timeout(),
    ));

    // Stop the listener even when the signal itself fails.
    let signalled = shutdown.wait().await;
    reporter.shutdown_requested();
    stop.cancel();
    let drained = serving.await?;
    reporter.shutdown_completed(drained);
    signalled?;
    Ok(())
}
