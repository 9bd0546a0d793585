//! Process-wide `tracing` setup.
//!
//! Events go to stderr, filtered by the configured directive, as either one
//! flattened JSON object per line or compact text. Every module logs under a
//! target such as `aggregator::watch`, so `log_filter` can tune the dispatch,
//! watch, transport and health streams independently.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{Layer, Registry};

use aggregator_config::{Config, LogFormat};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Proof that the global subscriber is in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Output format chosen by the call that installed the subscriber.
    #[must_use]
    pub fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive does not parse.
    #[error("invalid log filter \"{directive}\": {source}")]
    Filter {
        /// Directive as configured.
        directive: String,
        /// Parser failure.
        #[source]
        source: ParseError,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install telemetry subscriber: {source}")]
    Subscriber {
        /// Installation failure.
        #[source]
        source: TryInitError,
    },
}

/// Installs the global subscriber on first use.
///
/// Later calls hand back the handle of the first installation without touching
/// global state, so embedders and tests may call this repeatedly. Their
/// configuration is not applied.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is malformed or a subscriber
/// installed elsewhere already owns the global slot.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| install(config).map(|()| config.log_format()))
        .map(|format| TelemetryHandle { format: *format })
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    tracing_subscriber::registry()
        .with(output_layer(config.log_format()))
        .with(filter)
        .try_init()
        .map_err(|source| TelemetryError::Subscriber { source })
}

fn parse_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|source| TelemetryError::Filter {
        directive: directive.to_owned(),
        source,
    })
}

fn output_layer(format: LogFormat) -> OutputLayer {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true);
    match format {
        // Request-scoped fields live on events, not spans.
        LogFormat::Json => layer
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => layer
            .compact()
            .with_ansi(io::stderr().is_terminal())
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("aggregator=loud")]
    #[case("aggregator::watch=chatty")]
    fn rejects_malformed_filters(#[case] directive: &str) {
        let error = parse_filter(directive).expect_err("directive is malformed");
        assert!(
            matches!(&error, TelemetryError::Filter { directive: seen, .. } if seen == directive),
            "{error}"
        );
    }

    #[rstest]
    #[case("info")]
    #[case("warn,aggregator::watch=debug,aggregator::transport=trace")]
    fn accepts_per_target_directives(#[case] directive: &str) {
        assert!(parse_filter(directive).is_ok());
    }

    #[test]
    fn repeated_initialisation_reuses_the_first_subscriber() {
        let first = initialise(&Config::default()).expect("first install");
        let compact = Config {
            log_format: LogFormat::Compact,
            ..Config::default()
        };
        let second = initialise(&compact).expect("later calls succeed");
        assert_eq!(first, second);
    }
}
