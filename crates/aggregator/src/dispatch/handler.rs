//! Adapter between hyper connections and the [`Router`].

use std::error::Error as StdError;

use http::{Request, Version};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::context::RequestContext;
use super::errors::ApiError;
use super::response::ApiResponse;
use super::router::{DISPATCH_TARGET, Router};

/// Buffers request bodies and hands requests to the router with a fresh
/// per-request cancellation token.
#[derive(Clone)]
pub struct ApiService {
    router: Router,
    shutdown: CancellationToken,
    max_request_bytes: usize,
}

impl ApiService {
    /// Creates a service. Request tokens are children of `shutdown`.
    pub fn new(router: Router, shutdown: CancellationToken, max_request_bytes: usize) -> Self {
        Self {
            router,
            shutdown,
            max_request_bytes,
        }
    }

    /// Serves one request.
    pub async fn call<B>(&self, request: Request<B>) -> ApiResponse
    where
        B: Body,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let streaming = request.version() >= Version::HTTP_11;
        let (parts, body) = request.into_parts();
        let bytes = match Limited::new(body, self.max_request_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(error) => {
                let api_error = if error.downcast_ref::<LengthLimitError>().is_some() {
                    ApiError::payload_too_large(format!(
                        "request body exceeds {} bytes",
                        self.max_request_bytes
                    ))
                } else {
                    ApiError::validation(format!("failed to read request body: {error}"))
                };
                debug!(
                    target: DISPATCH_TARGET,
                    path = %parts.uri.path(),
                    error = %api_error,
                    "rejected request body"
                );
                return api_error.into_response();
            }
        };

        let context = RequestContext::new(self.shutdown.child_token(), streaming);
        self.router
            .handle(Request::from_parts(parts, bytes), context)
            .await
    }
}
