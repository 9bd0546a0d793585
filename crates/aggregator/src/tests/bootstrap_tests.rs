//! Unit tests for the bootstrap sequence.

use rstest::{fixture, rstest};

use aggregator_config::Config;

use crate::bootstrap::{BootstrapError, StaticConfigLoader, bootstrap_with};

use super::support::{
    HealthEvent, RecordingHealthReporter, UnparsableFlagsLoader, loopback_loader,
};

#[fixture]
fn reporter() -> RecordingHealthReporter {
    RecordingHealthReporter::default()
}

#[rstest]
fn successful_bootstrap_reports_start_and_success(reporter: RecordingHealthReporter) {
    let bootstrapped =
        bootstrap_with(&loopback_loader(), &reporter).expect("bootstrap should succeed");

    assert_eq!(bootstrapped.config().listen_port, 0);
    assert_eq!(
        reporter.events(),
        [
            HealthEvent::BootstrapStarting,
            HealthEvent::BootstrapSucceeded {
                listen: "127.0.0.1:0".to_owned()
            }
        ]
    );
}

#[rstest]
fn configuration_failures_are_reported(reporter: RecordingHealthReporter) {
    let error =
        bootstrap_with(&UnparsableFlagsLoader, &reporter).expect_err("bootstrap should fail");

    assert!(matches!(error, BootstrapError::Configuration { .. }), "{error}");
    assert!(error.to_string().starts_with("failed to load configuration"));
    assert_eq!(
        reporter.events(),
        [
            HealthEvent::BootstrapStarting,
            HealthEvent::BootstrapFailed(error.to_string())
        ]
    );
}

#[rstest]
fn static_loader_hands_out_its_configuration(reporter: RecordingHealthReporter) {
    let config = Config {
        listen_port: 9443,
        max_request_bytes: 64,
        ..Config::default()
    };
    let bootstrapped = bootstrap_with(&StaticConfigLoader::new(config.clone()), &reporter)
        .expect("bootstrap should succeed");

    assert_eq!(bootstrapped.into_config(), config);
}

#[rstest]
#[case::blank_host(Config { listen_host: " ".to_owned(), ..Config::default() }, "listen_host must not be empty")]
#[case::zero_body_limit(Config { max_request_bytes: 0, ..Config::default() }, "max_request_bytes must be positive")]
fn unusable_configurations_are_refused(
    reporter: RecordingHealthReporter,
    #[case] config: Config,
    #[case] expected: &str,
) {
    let error = bootstrap_with(&StaticConfigLoader::new(config), &reporter)
        .expect_err("bootstrap should refuse the configuration");

    assert!(
        matches!(error, BootstrapError::InvalidConfiguration { reason } if reason == expected),
        "{error}"
    );
    assert_eq!(
        reporter.events(),
        [
            HealthEvent::BootstrapStarting,
            HealthEvent::BootstrapFailed(format!("invalid configuration: {expected}"))
        ]
    );
}
