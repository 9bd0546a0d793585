//! Configuration sources for lifecycle tests.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};

use aggregator_config::Config;

use crate::bootstrap::{ConfigLoader, StaticConfigLoader};

/// Loopback listener on an OS-assigned port with a short drain window.
pub fn loopback_loader() -> StaticConfigLoader {
    StaticConfigLoader::new(Config {
        listen_host: "127.0.0.1".to_owned(),
        listen_port: 0,
        shutdown_timeout_secs: 2,
        ..Config::default()
    })
}

/// Resolves flags that cannot parse, so every load fails inside
/// `ortho_config`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnparsableFlagsLoader;

impl ConfigLoader for UnparsableFlagsLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(
            ["aggregator", "--listen-port", "not-a-port"].map(OsString::from),
        )
    }
}
