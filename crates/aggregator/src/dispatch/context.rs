//! Per-request context handed to handlers.

use tokio_util::sync::CancellationToken;

/// Request-scoped state shared by the dispatch and watch layers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancel: CancellationToken,
    streaming: bool,
}

impl RequestContext {
    /// Creates a context. `streaming` states whether the connection can
    /// deliver a body incrementally (HTTP/1.1 chunked or newer).
    pub fn new(cancel: CancellationToken, streaming: bool) -> Self {
        Self { cancel, streaming }
    }

    /// Cancelled when the request should stop, e.g. on server shutdown or
    /// client disconnect.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether incremental delivery is available.
    pub fn supports_streaming(&self) -> bool {
        self.streaming
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(CancellationToken::new(), true)
    }
}
