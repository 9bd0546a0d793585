//! Startup sequence: resolve configuration, check it can serve, install
//! telemetry. Each outcome is told to the [`HealthReporter`].

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use aggregator_config::Config;

use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Source of the server configuration.
pub trait ConfigLoader: Send + Sync {
    /// Resolves the configuration layers.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

impl<T> ConfigLoader for Box<T>
where
    T: ConfigLoader + ?Sized,
{
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        (**self).load()
    }
}

/// Reads defaults, `--config-path`, `AGGREGATOR_*` variables and flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Hands out a configuration the embedder resolved itself.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader(Config);

impl StaticConfigLoader {
    /// Serves `config` on every load.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self(config)
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.0.clone())
    }
}

/// Reasons the server refuses to start.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A configuration layer could not be read or merged.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Loader failure.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The merged configuration cannot drive a listener.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Which setting is unusable.
        reason: &'static str,
    },
    /// The log subscriber could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Telemetry failure.
        #[source]
        source: TelemetryError,
    },
}

/// Configuration and telemetry ready for serving.
#[derive(Debug, Clone)]
pub struct Bootstrapped {
    config: Config,
    telemetry: TelemetryHandle,
}

impl Bootstrapped {
    /// Configuration the server runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle of the installed subscriber.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Drops the telemetry handle and keeps the configuration.
    #[must_use]
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Runs the startup sequence.
///
/// # Errors
///
/// Returns the first [`BootstrapError`]. The reporter has already seen it.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
) -> Result<Bootstrapped, BootstrapError> {
    reporter.bootstrap_starting();
    let outcome = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })
        .and_then(|config| validate(&config).map(|()| config))
        .and_then(|config| {
            telemetry::initialise(&config)
                .map(|telemetry| Bootstrapped { config, telemetry })
                .map_err(|source| BootstrapError::Telemetry { source })
        });

    match &outcome {
        Ok(bootstrapped) => reporter.bootstrap_succeeded(bootstrapped.config()),
        Err(error) => reporter.bootstrap_failed(error),
    }
    outcome
}

fn validate(config: &Config) -> Result<(), BootstrapError> {
    let reason = if config.listen_host.trim().is_empty() {
        "listen_host must not be empty"
    } else if config.max_request_bytes() == 0 {
        "max_request_bytes must be positive"
    } else {
        return Ok(());
    };
    Err(BootstrapError::InvalidConfiguration { reason })
}
