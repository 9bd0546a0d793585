//! Listener setup failures.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Why the API listener could not come up.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// `listen_host` did not resolve.
    #[error("cannot resolve listen address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    /// `listen_host` resolved to nothing.
    #[error("listen address {host}:{port} resolved to no socket addresses")]
    ResolveEmpty { host: String, port: u16 },
    /// The port is taken or the interface is unavailable.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// The socket was bound but its port could not be read back.
    #[error("cannot read the bound listen address: {source}")]
    LocalAddr {
        #[source]
        source: io::Error,
    },
}
