//! BDD test world for routing, resource access and watch scenarios.
//!
//! Requests go through [`Router::handle`] in process on a current-thread
//! runtime, so scenarios observe exactly what the HTTP layer would write.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use http::header::CONTENT_TYPE;
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::dispatch::{ApiBody, RequestContext, Router, RouterBuilder, RouterError};
use crate::resource::ResourceDescriptor;
use crate::testing::{ScriptedStore, WatchScript};

use super::fixtures::{group_version, kinds};
use super::http::{next_json_frame, read_text, request};

const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// Captured non-streaming response.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: String,
}

impl CapturedResponse {
    /// Body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("body should be JSON")
    }
}

/// Scenario world shared across dispatch steps.
pub struct DispatchWorld {
    runtime: Runtime,
    pub store: ScriptedStore,
    descriptors: Vec<ResourceDescriptor>,
    router: Option<Router>,
    build_error: Option<RouterError>,
    response: Option<CapturedResponse>,
    watch_status: Option<StatusCode>,
    watch_body: Option<ApiBody>,
    watch_cancel: CancellationToken,
    scripts: Vec<WatchScript>,
}

impl DispatchWorld {
    /// Builds an empty world.
    #[must_use]
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build test runtime");
        Self {
            runtime,
            store: ScriptedStore::new(),
            descriptors: Vec::new(),
            router: None,
            build_error: None,
            response: None,
            watch_status: None,
            watch_body: None,
            watch_cancel: CancellationToken::new(),
            scripts: Vec::new(),
        }
    }

    /// Adds a descriptor to the next build.
    pub fn register(&mut self, descriptor: ResourceDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Builds the router from the registered descriptors.
    pub fn build(&mut self) {
        let result = RouterBuilder::new(group_version())
            .resources(self.descriptors.clone())
            .build(Arc::new(self.store.clone()), Arc::new(kinds()));
        match result {
            Ok(router) => self.router = Some(router),
            Err(error) => self.build_error = Some(error),
        }
    }

    /// Build error, if the last build failed.
    pub fn build_error(&self) -> Option<&RouterError> {
        self.build_error.as_ref()
    }

    fn router(&mut self) -> Router {
        if self.router.is_none() && self.build_error.is_none() {
            self.build();
        }
        self.router.clone().expect("router should have built")
    }

    /// Sends a request and captures the full response.
    pub fn send(&mut self, method: Method, uri: &str) {
        let router = self.router();
        let response = self.runtime.block_on(async {
            let response = router
                .handle(request(method, uri), RequestContext::default())
                .await;
            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_owned();
            let body = read_text(response).await;
            CapturedResponse {
                status,
                content_type,
                body,
            }
        });
        self.response = Some(response);
    }

    /// Last captured response.
    pub fn response(&self) -> &CapturedResponse {
        self.response.as_ref().expect("no request was sent")
    }

    /// Queues a hand-driven watch for the next watch request.
    pub fn script_watch(&mut self) {
        self.scripts.push(self.store.script_watch());
    }

    /// The most recently scripted watch.
    pub fn script(&self) -> &WatchScript {
        self.scripts.last().expect("no watch was scripted")
    }

    /// Opens a watch and keeps its body for frame-by-frame reads.
    pub fn open_watch(&mut self, uri: &str) {
        let router = self.router();
        let context = RequestContext::new(self.watch_cancel.clone(), true);
        let response = self
            .runtime
            .block_on(router.handle(request(Method::GET, uri), context));
        let status = response.status();
        self.watch_status = Some(status);
        if status.is_success() {
            self.watch_body = Some(response.into_body());
        } else {
            let body = self.runtime.block_on(read_text(response));
            self.response = Some(CapturedResponse {
                status,
                content_type: String::new(),
                body,
            });
        }
    }

    /// Status the watch request was answered with.
    pub fn watch_status(&self) -> Option<StatusCode> {
        self.watch_status
    }

    /// Reads the next frame; `None` means the stream ended.
    pub fn next_frame(&mut self) -> Option<Value> {
        let body = self.watch_body.as_mut().expect("no watch is open");
        self.runtime
            .block_on(async { tokio::time::timeout(FRAME_TIMEOUT, next_json_frame(body)).await })
            .expect("timed out waiting for a watch frame")
    }

    /// Cancels the watch request as a server shutdown would.
    pub fn cancel_watch(&self) {
        self.watch_cancel.cancel();
    }

    /// Drops the response body as a disconnecting client would.
    pub fn disconnect(&mut self) {
        self.watch_body.take();
    }

    /// Whether the watch request was cancelled.
    pub fn watch_cancelled(&self) -> bool {
        self.watch_cancel.is_cancelled()
    }
}

impl Default for DispatchWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}
