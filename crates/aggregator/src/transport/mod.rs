//! TCP listener serving the router over HTTP/1.1.
//!
//! The listener accepts connections until the shutdown token fires, then
//! stops accepting and gives in-flight connections a bounded drain window.

mod errors;
mod listener;

pub use self::errors::ListenerError;
pub use self::listener::HttpListener;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
