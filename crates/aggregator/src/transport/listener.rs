//! Accept loop and per-connection HTTP serving.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::{TcpListener, TcpStream, lookup_host};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::ApiService;

use super::{ListenerError, TRANSPORT_TARGET};

const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Bound TCP listener.
#[derive(Debug)]
pub struct HttpListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl HttpListener {
    /// Resolves `host:port` and binds the first address returned.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when resolution yields nothing or binding
    /// fails.
    pub async fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let mut addrs = lookup_host((host, port))
            .await
            .map_err(|source| ListenerError::Resolve {
                host: host.to_owned(),
                port,
                source,
            })?;
        let addr = addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address actually bound; differs from the request when port `0` was
    /// given.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves connections until `shutdown` fires, then waits up to `drain`
    /// for open connections to finish.
    ///
    /// Returns `true` when every connection finished inside the window.
    pub async fn serve(
        self,
        service: ApiService,
        shutdown: CancellationToken,
        drain: Duration,
    ) -> bool {
        info!(
            target: TRANSPORT_TARGET,
            address = %self.local_addr,
            "HTTP listener active"
        );
        let graceful = GracefulShutdown::new();
        let mut last_error = None::<io::ErrorKind>;
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        last_error = None;
                        serve_connection(stream, peer, service.clone(), &graceful);
                    }
                    Err(error) => {
                        let kind = error.kind();
                        if last_error != Some(kind) {
                            warn!(
                                target: TRANSPORT_TARGET,
                                error = %error,
                                "socket accept error"
                            );
                        }
                        last_error = Some(kind);
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                },
            }
        }

        drop(self.listener);
        info!(
            target: TRANSPORT_TARGET,
            drain_ms = drain.as_millis(),
            "listener stopped; draining connections"
        );
        if tokio::time::timeout(drain, graceful.shutdown()).await.is_ok() {
            info!(target: TRANSPORT_TARGET, "connections drained");
            true
        } else {
            warn!(
                target: TRANSPORT_TARGET,
                drain_ms = drain.as_millis(),
                "drain window elapsed with connections still open"
            );
            false
        }
    }
}

fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    service: ApiService,
    graceful: &GracefulShutdown,
) {
    let handler = service_fn(move |request: Request<Incoming>| {
        let service = service.clone();
        async move { Ok::<_, Infallible>(service.call(request).await) }
    });
    let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), handler);
    let connection = graceful.watch(connection);
    tokio::spawn(async move {
        if let Err(error) = connection.await {
            debug!(
                target: TRANSPORT_TARGET,
                peer = %peer,
                error = %error,
                "connection closed with error"
            );
        }
    });
}
