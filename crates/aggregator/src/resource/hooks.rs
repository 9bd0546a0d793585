//! Caller-supplied transform hooks and handler callbacks.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use aggregator_types::{DynamicObject, ObjectList};

use crate::dispatch::{ApiRequest, ApiResponse, RequestContext};

/// Failure reported by a transform hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Creates a hook error with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Converts a fetched list into the response payload.
///
/// Get requests pass through the same hook: the object is wrapped in a
/// one-item list and the first item of the hook's result is returned.
///
/// `context` carries the request's cancellation token, which fires when the
/// client goes away or the server shuts down. Hooks doing their own I/O
/// should stop when it does.
#[async_trait]
pub trait ListTransform: Send + Sync {
    /// Transforms `list` fetched for `(namespace, name)`.
    async fn transform(
        &self,
        context: &RequestContext,
        namespace: &str,
        name: &str,
        list: ObjectList,
    ) -> Result<Value, HookError>;
}

#[async_trait]
impl<F> ListTransform for F
where
    F: Fn(&RequestContext, &str, &str, ObjectList) -> Result<Value, HookError> + Send + Sync,
{
    async fn transform(
        &self,
        context: &RequestContext,
        namespace: &str,
        name: &str,
        list: ObjectList,
    ) -> Result<Value, HookError> {
        self(context, namespace, name, list)
    }
}

/// Converts a watched object into the event payload.
#[async_trait]
pub trait WatchTransform: Send + Sync {
    /// Transforms `object`; `namespace` and `name` come from the request path.
    /// `context` stays live for as long as the stream does.
    async fn transform(
        &self,
        context: &RequestContext,
        namespace: &str,
        name: &str,
        object: DynamicObject,
    ) -> Result<Value, HookError>;
}

#[async_trait]
impl<F> WatchTransform for F
where
    F: Fn(&RequestContext, &str, &str, DynamicObject) -> Result<Value, HookError> + Send + Sync,
{
    async fn transform(
        &self,
        context: &RequestContext,
        namespace: &str,
        name: &str,
        object: DynamicObject,
    ) -> Result<Value, HookError> {
        self(context, namespace, name, object)
    }
}

/// Handler served verbatim at a raw endpoint path.
#[async_trait]
pub trait RawHandler: Send + Sync {
    /// Produces the full response for `request`.
    async fn handle(&self, request: ApiRequest) -> ApiResponse;
}

#[async_trait]
impl<F> RawHandler for F
where
    F: Fn(ApiRequest) -> ApiResponse + Send + Sync,
{
    async fn handle(&self, request: ApiRequest) -> ApiResponse {
        self(request)
    }
}

/// Per-verb callback for resources that bypass structured bindings.
#[async_trait]
pub trait CustomHandler: Send + Sync {
    /// Produces the full response for `request` addressed at
    /// `(namespace, name)`.
    async fn handle(&self, namespace: &str, name: &str, request: ApiRequest) -> ApiResponse;
}

#[async_trait]
impl<F> CustomHandler for F
where
    F: Fn(&str, &str, ApiRequest) -> ApiResponse + Send + Sync,
{
    async fn handle(&self, namespace: &str, name: &str, request: ApiRequest) -> ApiResponse {
        self(namespace, name, request)
    }
}
