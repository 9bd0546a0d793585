//! HTTP request dispatch for the aggregation API.
//!
//! Requests are resolved against an immutable route table built by
//! [`RouterBuilder`]:
//!
//! - `/healthz` and `/readyz` answer `ok` and `ready`.
//! - `/apis` and `/apis/{group}/{version}` serve pre-encoded discovery
//!   documents.
//! - Raw endpoints match their full path exactly and win over item routes.
//! - `/apis/{group}/{version}/{resource}[/{name}]` and
//!   `/apis/{group}/{version}/namespaces/{ns}/{resource}[/{name}]` reach the
//!   resource's structured or custom binding.
//!
//! Structured bindings serve Get/List here and hand `watch=true` to the watch
//! translator. Custom bindings map the method onto a callback. Every failure
//! is written as a plain-text body carrying one status code.

mod context;
mod custom;
mod errors;
mod handler;
mod resource;
mod response;
mod router;

pub use self::context::RequestContext;
pub use self::custom::select_verb;
pub use self::errors::ApiError;
pub use self::handler::ApiService;
pub use self::response::{
    ApiBody, ApiRequest, ApiResponse, empty_body, error_response, full_body, json_response,
    text_response,
};
pub use self::router::{Router, RouterBuilder, RouterError};

pub(crate) use self::response::watch_response;
