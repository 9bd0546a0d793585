//! Get and List against the backing store.
//!
//! Both paths stamp kind metadata and run the list transform, so one hook
//! implementation serves collection and item reads alike. Watch requests are
//! handed to [`crate::watch`].

use http::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use aggregator_types::{GroupVersionKind, ObjectList};

use crate::query::{ListQuery, QueryParams};
use crate::resource::StructuredBinding;
use crate::store::{KindResolver, ResourceStore};
use crate::watch::{self, WatchRequest};

use super::context::RequestContext;
use super::errors::ApiError;
use super::response::{ApiRequest, ApiResponse, json_response};
use super::router::DISPATCH_TARGET;

/// Everything needed to serve one structured resource request.
pub(crate) struct ResourceAccess<'a> {
    pub(crate) store: &'a dyn ResourceStore,
    pub(crate) kinds: &'a dyn KindResolver,
    pub(crate) binding: &'a StructuredBinding,
    pub(crate) namespace: &'a str,
    pub(crate) name: &'a str,
    pub(crate) context: &'a RequestContext,
}

/// Object and list kinds resolved for a request.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedKinds {
    pub(crate) object: GroupVersionKind,
    pub(crate) list: GroupVersionKind,
}

/// Serves a structured resource request.
pub(crate) async fn serve(access: ResourceAccess<'_>, request: ApiRequest) -> ApiResponse {
    if request.method() != Method::GET {
        return ApiError::method_not_allowed("only GET").into_response();
    }

    let kinds = match access.resolve_kinds() {
        Ok(kinds) => kinds,
        Err(error) => return error.into_response(),
    };

    let params = QueryParams::parse(request.uri().query());
    if params.is_watch() {
        return watch::serve(WatchRequest {
            store: access.store,
            resource: access.binding.resource(),
            kind: kinds.object,
            namespace: access.namespace,
            name: access.name,
            params: &params,
            transform: access.binding.watch_transform().cloned(),
            context: access.context,
        })
        .await;
    }

    let result = if access.name.is_empty() {
        access.list(&kinds, &params).await
    } else {
        access.get(&kinds).await
    };
    match result {
        Ok(body) => json_response(StatusCode::OK, &body),
        Err(error) => {
            debug!(
                target: DISPATCH_TARGET,
                resource = %access.binding.resource(),
                namespace = access.namespace,
                name = access.name,
                status = error.status().as_u16(),
                error = %error,
                "resource request failed"
            );
            error.into_response()
        }
    }
}

impl ResourceAccess<'_> {
    fn resolve_kinds(&self) -> Result<ResolvedKinds, ApiError> {
        let object = self
            .kinds
            .kind_for(self.binding.resource())
            .map_err(|error| ApiError::internal(format!("failed to find kind: {error}")))?;
        let list = self
            .kinds
            .kind_for(self.binding.list_resource())
            .map_err(|error| ApiError::internal(format!("failed to find list kind: {error}")))?;
        Ok(ResolvedKinds { object, list })
    }

    async fn get(&self, kinds: &ResolvedKinds) -> Result<Value, ApiError> {
        let resource = self.binding.resource();
        let mut object = self
            .store
            .get(resource, self.namespace, self.name)
            .await
            .map_err(|error| {
                ApiError::from_store(error, &format!("failed to get {}", resource.resource))
            })?;
        object.set_group_version_kind(&kinds.object);

        let mut list = self.binding.new_list();
        list.metadata.resource_version = object.resource_version().to_owned();
        list.items.push(object);
        list.set_group_version_kind(&kinds.list);

        let transformed = self.transform(list).await?;
        Ok(first_item(transformed))
    }

    async fn list(&self, kinds: &ResolvedKinds, params: &QueryParams) -> Result<Value, ApiError> {
        let query = ListQuery::parse(params, "")?;
        let resource = self.binding.resource();
        let mut list = self
            .store
            .list(resource, self.namespace, &query)
            .await
            .map_err(|error| {
                ApiError::from_store(error, &format!("failed to list {}", resource.resource))
            })?;
        list.set_group_version_kind(&kinds.list);
        list.set_item_group_version_kind(&kinds.object);
        self.transform(list).await
    }

    async fn transform(&self, list: ObjectList) -> Result<Value, ApiError> {
        match self.binding.list_transform() {
            Some(hook) => hook
                .transform(self.context, self.namespace, self.name, list)
                .await
                .map_err(|error| {
                    ApiError::internal(format!(
                        "failed to transform {}: {error}",
                        self.binding.resource().resource
                    ))
                }),
            None => serde_json::to_value(&list).map_err(|error| {
                ApiError::internal(format!("failed to encode response: {error}"))
            }),
        }
    }
}

/// Unwraps `items[0]` of a list-shaped value; anything else passes through.
fn first_item(value: Value) -> Value {
    let first = value
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .cloned();
    first.unwrap_or(value)
}
