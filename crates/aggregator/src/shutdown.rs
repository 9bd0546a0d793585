//! Shutdown notification.

use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::server::SERVER_TARGET;

/// Abstraction over shutdown notification mechanisms.
#[async_trait]
pub trait ShutdownSignal: Send + Sync {
    /// Resolves once shutdown should proceed.
    async fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Waits for `SIGINT`, or `SIGTERM` on Unix.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

#[async_trait]
impl ShutdownSignal for SystemShutdownSignal {
    #[cfg(unix)]
    async fn wait(&self) -> Result<(), ShutdownError> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).map_err(|source| ShutdownError::Install { source })?;
        let received = tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.map_err(|source| ShutdownError::Install { source })?;
                "SIGINT"
            }
            _ = terminate.recv() => "SIGTERM",
        };
        info!(target: SERVER_TARGET, signal = received, "shutdown signal received");
        Ok(())
    }

    #[cfg(not(unix))]
    async fn wait(&self) -> Result<(), ShutdownError> {
        tokio::signal::ctrl_c()
            .await
            .map_err(|source| ShutdownError::Install { source })?;
        info!(target: SERVER_TARGET, signal = "ctrl-c", "shutdown signal received");
        Ok(())
    }
}

/// Embedders and tests trigger shutdown by cancelling the token.
#[async_trait]
impl ShutdownSignal for CancellationToken {
    async fn wait(&self) -> Result<(), ShutdownError> {
        self.cancelled().await;
        Ok(())
    }
}
