//! Verb routing for resources served by caller callbacks.

use http::Method;
use tracing::debug;

use crate::query::QueryParams;
use crate::resource::{CustomHandlerSet, CustomVerb};

use super::errors::ApiError;
use super::response::{ApiRequest, ApiResponse};
use super::router::DISPATCH_TARGET;

/// Maps a request onto a custom verb.
///
/// | Method | watch | name    | Verb    |
/// |--------|-------|---------|---------|
/// | GET    | true  | any     | Watch   |
/// | GET    | false | empty   | List    |
/// | GET    | false | present | Get     |
/// | PUT    | any   | any     | Replace |
/// | DELETE | any   | any     | Delete  |
/// | POST   | any   | any     | Create  |
///
/// Any other method maps to nothing.
pub fn select_verb(method: &Method, watch: bool, name: &str) -> Option<CustomVerb> {
    match *method {
        Method::GET if watch => Some(CustomVerb::Watch),
        Method::GET if name.is_empty() => Some(CustomVerb::List),
        Method::GET => Some(CustomVerb::Get),
        Method::PUT => Some(CustomVerb::Replace),
        Method::DELETE => Some(CustomVerb::Delete),
        Method::POST => Some(CustomVerb::Create),
        _ => None,
    }
}

/// Dispatches to the callback for the selected verb.
pub(crate) async fn serve(
    handlers: &CustomHandlerSet,
    resource: &str,
    namespace: &str,
    name: &str,
    request: ApiRequest,
) -> ApiResponse {
    let watch = QueryParams::parse(request.uri().query()).is_watch();
    let Some(verb) = select_verb(request.method(), watch, name) else {
        return ApiError::no_route().into_response();
    };
    let Some(handler) = handlers.handler(verb) else {
        return ApiError::method_not_allowed(format!("{verb} is not supported for {resource}"))
            .into_response();
    };
    debug!(
        target: DISPATCH_TARGET,
        resource,
        namespace,
        name,
        verb = %verb,
        "dispatching custom handler"
    );
    handler.handle(namespace, name, request).await
}
