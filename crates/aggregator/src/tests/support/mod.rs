//! Test harness utilities shared by unit and behavioural suites.

mod config_loader;
mod fixtures;
mod http;
mod reporter;
mod world;

pub use config_loader::{UnparsableFlagsLoader, loopback_loader};
pub use fixtures::{
    group_version, kinds, router_with, widget, widget_binding, widget_descriptor, widgets,
};
pub use http::{get, next_json_frame, read_json, read_text, request};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{DispatchWorld, world};
