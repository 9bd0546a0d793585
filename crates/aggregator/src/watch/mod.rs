//! Watch stream translation.
//!
//! One session per `watch=true` request, moving through
//! `Init → Negotiating → Subscribed → Streaming → Closed`:
//!
//! - **Negotiating** checks the transport can stream and parses the
//!   [`WatchQuery`]. Failures answer 500 or 400 before any backing call.
//! - **Subscribed** opens the backing watch. An expired resource version
//!   answers 410; any other failure answers 500.
//! - **Streaming** waits on cancellation and the next backing event, with
//!   cancellation winning ties. Each forwarded event becomes one
//!   `{"type":…,"object":…}` line. Once headers are sent, failures are
//!   reported as a terminal `ERROR` frame carrying a `Status`.
//!
//! The backing subscription is held by a guard that stops it exactly once on
//! every path, including the response body being dropped mid-stream.

mod guard;
mod stream;

use std::sync::Arc;

use aggregator_types::{GroupVersionKind, GroupVersionResource};
use tracing::{debug, info};

use crate::dispatch::{ApiError, ApiResponse, RequestContext, watch_response};
use crate::query::{QueryParams, WatchQuery};
use crate::resource::WatchTransform;
use crate::store::{ResourceStore, StoreError};

use self::guard::SubscriptionGuard;
use self::stream::{StreamSettings, WatchStream};

pub(crate) const WATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::watch");

/// Lifecycle states of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Request accepted, nothing checked yet.
    Init,
    /// Validating transport and query parameters.
    Negotiating,
    /// Backing watch open, headers not yet written.
    Subscribed,
    /// Forwarding events.
    Streaming,
    /// Terminal; the subscription has been released.
    Closed,
}

/// Inputs for one watch request.
pub(crate) struct WatchRequest<'a> {
    pub(crate) store: &'a dyn ResourceStore,
    pub(crate) resource: &'a GroupVersionResource,
    pub(crate) kind: GroupVersionKind,
    pub(crate) namespace: &'a str,
    pub(crate) name: &'a str,
    pub(crate) params: &'a QueryParams,
    pub(crate) transform: Option<Arc<dyn WatchTransform>>,
    pub(crate) context: &'a RequestContext,
}

struct WatchSession<'a> {
    state: WatchState,
    request: WatchRequest<'a>,
}

impl<'a> WatchSession<'a> {
    fn new(request: WatchRequest<'a>) -> Self {
        Self {
            state: WatchState::Init,
            request,
        }
    }

    fn transition(&mut self, next: WatchState) {
        debug!(
            target: WATCH_TARGET,
            resource = %self.request.resource,
            from = ?self.state,
            to = ?next,
            "watch state transition"
        );
        self.state = next;
    }

    fn fail(&mut self, error: ApiError) -> ApiResponse {
        info!(
            target: WATCH_TARGET,
            resource = %self.request.resource,
            status = error.status().as_u16(),
            error = %error,
            "watch rejected"
        );
        self.transition(WatchState::Closed);
        error.into_response()
    }

    fn negotiate(&self) -> Result<WatchQuery, ApiError> {
        if !self.request.context.supports_streaming() {
            return Err(ApiError::internal("streaming not supported by server"));
        }
        Ok(WatchQuery::parse(self.request.params, self.request.name)?)
    }

    async fn subscribe(&self, query: &WatchQuery) -> Result<SubscriptionGuard, ApiError> {
        let request = &self.request;
        match request
            .store
            .watch(request.resource, request.namespace, query)
            .await
        {
            Ok(subscription) => Ok(SubscriptionGuard::new(
                subscription,
                request.resource.to_string(),
            )),
            Err(StoreError::Gone { message }) => Err(ApiError::gone(message)),
            Err(error) => Err(ApiError::internal(format!(
                "failed to initialize watcher: {error}"
            ))),
        }
    }

    async fn run(mut self) -> ApiResponse {
        self.transition(WatchState::Negotiating);
        let query = match self.negotiate() {
            Ok(query) => query,
            Err(error) => return self.fail(error),
        };

        let guard = match self.subscribe(&query).await {
            Ok(guard) => guard,
            Err(error) => return self.fail(error),
        };
        self.transition(WatchState::Subscribed);

        let request = self.request;
        let stream = WatchStream::new(
            guard,
            request.context.cancellation().clone(),
            StreamSettings {
                kind: request.kind,
                namespace: request.namespace.to_owned(),
                name: request.name.to_owned(),
                allow_bookmarks: query.allow_watch_bookmarks,
                transform: request.transform,
                context: request.context.clone(),
            },
        );
        debug!(
            target: WATCH_TARGET,
            resource = %request.resource,
            from = ?WatchState::Subscribed,
            to = ?WatchState::Streaming,
            send_initial_events = query.send_initial_events,
            timeout_seconds = query.timeout_seconds,
            "watch state transition"
        );
        watch_response(stream.into_body())
    }
}

/// Runs a watch session and returns its (streaming) response.
pub(crate) async fn serve(request: WatchRequest<'_>) -> ApiResponse {
    WatchSession::new(request).run().await
}
