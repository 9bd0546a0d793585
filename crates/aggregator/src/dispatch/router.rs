//! Route table construction and request resolution.
//!
//! [`RouterBuilder`] validates descriptors once at startup and produces an
//! immutable, indexed [`Router`]. Resolution is a pure function of the request
//! path; it never captures per-descriptor closures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{debug, info};

use aggregator_types::{ApiGroup, ApiGroupList, ApiResourceList, GroupVersion};

use crate::resource::{
    CustomHandlerSet, RawHandler, ResourceBinding, ResourceDescriptor, StructuredBinding,
};
use crate::store::{KindResolver, ResourceStore};

use super::context::RequestContext;
use super::custom;
use super::errors::ApiError;
use super::resource::{self, ResourceAccess};
use super::response::{ApiRequest, ApiResponse, encoded_json_response, text_response};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Errors raised while building a router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Two descriptors share a resource name.
    #[error("duplicate resource name: {name}")]
    DuplicateResource { name: String },
    /// A descriptor carries more than one structured or custom binding.
    #[error("resource {name} declares more than one structured or custom binding")]
    ConflictingBindings { name: String },
    /// Two raw endpoints resolve to the same path.
    #[error("raw endpoint {path} is registered more than once")]
    DuplicateEndpoint { path: String },
    /// A raw endpoint suffix is neither empty nor rooted.
    #[error("raw endpoint suffix \"{suffix}\" of resource {name} must be empty or start with '/'")]
    InvalidEndpoint { name: String, suffix: String },
    /// Discovery documents could not be encoded.
    #[error("failed to encode discovery document: {source}")]
    Discovery {
        #[source]
        source: serde_json::Error,
    },
}

/// Collects descriptors for one group/version.
pub struct RouterBuilder {
    group_version: GroupVersion,
    descriptors: Vec<ResourceDescriptor>,
}

impl RouterBuilder {
    /// Starts a router for `group_version`.
    pub fn new(group_version: GroupVersion) -> Self {
        Self {
            group_version,
            descriptors: Vec::new(),
        }
    }

    /// Registers a descriptor.
    pub fn resource(mut self, descriptor: ResourceDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Registers several descriptors in order.
    pub fn resources(mut self, descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    /// Validates the descriptors and freezes the route table.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DuplicateResource`] for the first repeated
    /// resource name, and the other [`RouterError`] variants for conflicting
    /// bindings, clashing raw endpoints or unencodable discovery documents.
    pub fn build(
        self,
        store: Arc<dyn ResourceStore>,
        kinds: Arc<dyn KindResolver>,
    ) -> Result<Router, RouterError> {
        let prefix = self.group_version.path_prefix();
        let mut names = HashSet::new();
        let mut routes = Vec::with_capacity(self.descriptors.len());
        let mut raw = Vec::new();
        let mut raw_index = HashMap::new();

        for descriptor in self.descriptors {
            if !names.insert(descriptor.name().to_owned()) {
                return Err(RouterError::DuplicateResource {
                    name: descriptor.name().to_owned(),
                });
            }
            let target = classify(&descriptor)?;
            for binding in descriptor.bindings() {
                let ResourceBinding::RawEndpoints(endpoints) = binding else {
                    continue;
                };
                for (suffix, handler) in endpoints.iter() {
                    if !suffix.is_empty() && !suffix.starts_with('/') {
                        return Err(RouterError::InvalidEndpoint {
                            name: descriptor.name().to_owned(),
                            suffix: suffix.to_owned(),
                        });
                    }
                    let path = format!("{prefix}/{}{suffix}", descriptor.name());
                    if raw_index.insert(path.clone(), raw.len()).is_some() {
                        return Err(RouterError::DuplicateEndpoint { path });
                    }
                    raw.push((path, Arc::clone(handler)));
                }
            }
            routes.push(ResourceRoute { descriptor, target });
        }

        let group_list = encode(&ApiGroupList::new(vec![ApiGroup::single_version(
            &self.group_version.group,
            &self.group_version.version,
        )]))?;
        let resource_list = encode(&ApiResourceList::new(
            self.group_version.api_version(),
            routes
                .iter()
                .map(|route| route.descriptor.to_api_resource())
                .collect(),
        ))?;
        let by_name = routes
            .iter()
            .enumerate()
            .map(|(index, route)| (route.descriptor.name().to_owned(), index))
            .collect();
        let serves_namespaced = routes.iter().any(|route| route.descriptor.is_namespaced());

        info!(
            target: DISPATCH_TARGET,
            group_version = %self.group_version,
            resources = routes.len(),
            raw_endpoints = raw.len(),
            "route table built"
        );

        Ok(Router {
            table: Arc::new(RouteTable {
                prefix,
                routes,
                by_name,
                raw,
                raw_index,
                serves_namespaced,
                group_list,
                resource_list,
                store,
                kinds,
            }),
        })
    }
}

fn classify(descriptor: &ResourceDescriptor) -> Result<RouteTarget, RouterError> {
    let mut target = RouteTarget::RawOnly;
    for binding in descriptor.bindings() {
        let next = match binding {
            ResourceBinding::RawEndpoints(_) => continue,
            ResourceBinding::Structured(structured) => RouteTarget::Structured(structured.clone()),
            ResourceBinding::Custom(handlers) => RouteTarget::Custom(handlers.clone()),
        };
        if !matches!(target, RouteTarget::RawOnly) {
            return Err(RouterError::ConflictingBindings {
                name: descriptor.name().to_owned(),
            });
        }
        target = next;
    }
    Ok(target)
}

fn encode<T: serde::Serialize>(document: &T) -> Result<Bytes, RouterError> {
    let mut encoded =
        serde_json::to_vec(document).map_err(|source| RouterError::Discovery { source })?;
    encoded.push(b'\n');
    Ok(Bytes::from(encoded))
}

enum RouteTarget {
    Structured(StructuredBinding),
    Custom(CustomHandlerSet),
    RawOnly,
}

struct ResourceRoute {
    descriptor: ResourceDescriptor,
    target: RouteTarget,
}

struct RouteTable {
    prefix: String,
    routes: Vec<ResourceRoute>,
    by_name: HashMap<String, usize>,
    raw: Vec<(String, Arc<dyn RawHandler>)>,
    raw_index: HashMap<String, usize>,
    serves_namespaced: bool,
    group_list: Bytes,
    resource_list: Bytes,
    store: Arc<dyn ResourceStore>,
    kinds: Arc<dyn KindResolver>,
}

/// Outcome of matching a request path against the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Probe(&'static str),
    GroupDiscovery,
    ResourceDiscovery,
    Raw(usize),
    Resource {
        index: usize,
        namespace: String,
        name: String,
    },
    NotFound,
}

impl RouteTable {
    fn resolve(&self, path: &str) -> Resolution {
        match path {
            "/healthz" => return Resolution::Probe("ok"),
            "/readyz" => return Resolution::Probe("ready"),
            "/apis" | "/apis/" => return Resolution::GroupDiscovery,
            _ => {}
        }
        let Some(rest) = path.strip_prefix(self.prefix.as_str()) else {
            return Resolution::NotFound;
        };
        if rest.is_empty() || rest == "/" {
            return Resolution::ResourceDiscovery;
        }
        if let Some(index) = self.raw_index.get(path) {
            return Resolution::Raw(*index);
        }
        let Some(rest) = rest.strip_prefix('/') else {
            return Resolution::NotFound;
        };
        let Some(segments) = decode_segments(rest) else {
            return Resolution::NotFound;
        };
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segments.as_slice() {
            ["namespaces", namespace, resource] if self.serves_namespaced => {
                self.namespaced(resource, namespace, "")
            }
            ["namespaces", namespace, resource, name] if self.serves_namespaced => {
                self.namespaced(resource, namespace, name)
            }
            [resource] => self.structured_or_custom(resource, |_| true, "", ""),
            [resource, name] => {
                self.structured_or_custom(resource, |route| !route.descriptor.is_namespaced(), "", name)
            }
            _ => Resolution::NotFound,
        }
    }

    fn namespaced(&self, resource: &str, namespace: &str, name: &str) -> Resolution {
        self.structured_or_custom(
            resource,
            |route| route.descriptor.is_namespaced(),
            namespace,
            name,
        )
    }

    fn structured_or_custom(
        &self,
        resource: &str,
        accepts: impl Fn(&ResourceRoute) -> bool,
        namespace: &str,
        name: &str,
    ) -> Resolution {
        let Some(&index) = self.by_name.get(resource) else {
            return Resolution::NotFound;
        };
        match self.routes.get(index) {
            Some(route) if !matches!(route.target, RouteTarget::RawOnly) && accepts(route) => {
                Resolution::Resource {
                    index,
                    namespace: namespace.to_owned(),
                    name: name.to_owned(),
                }
            }
            _ => Resolution::NotFound,
        }
    }
}

/// Splits and percent-decodes path segments. Empty segments and invalid
/// UTF-8 reject the path.
fn decode_segments(path: &str) -> Option<Vec<String>> {
    path.split('/')
        .map(|segment| {
            if segment.is_empty() {
                return None;
            }
            percent_decode_str(segment)
                .decode_utf8()
                .ok()
                .map(|decoded| decoded.into_owned())
        })
        .collect()
}

/// Immutable, cheaply clonable request router.
#[derive(Clone)]
pub struct Router {
    table: Arc<RouteTable>,
}

impl Router {
    /// Path prefix served for resources, e.g. `/apis/example.com/v1`.
    pub fn prefix(&self) -> &str {
        &self.table.prefix
    }

    /// Serves one request.
    pub async fn handle(&self, request: ApiRequest, context: RequestContext) -> ApiResponse {
        let table = &*self.table;
        let resolution = table.resolve(request.uri().path());
        debug!(
            target: DISPATCH_TARGET,
            method = %request.method(),
            path = %request.uri().path(),
            resolution = ?resolution,
            "routing request"
        );

        match resolution {
            Resolution::Probe(body) => text_response(StatusCode::OK, body),
            Resolution::GroupDiscovery => encoded_json_response(table.group_list.clone()),
            Resolution::ResourceDiscovery => encoded_json_response(table.resource_list.clone()),
            Resolution::Raw(index) => match table.raw.get(index) {
                Some((_, handler)) => handler.handle(request).await,
                None => ApiError::no_route().into_response(),
            },
            Resolution::Resource {
                index,
                namespace,
                name,
            } => {
                let Some(route) = table.routes.get(index) else {
                    return ApiError::no_route().into_response();
                };
                match &route.target {
                    RouteTarget::Structured(binding) => {
                        let access = ResourceAccess {
                            store: table.store.as_ref(),
                            kinds: table.kinds.as_ref(),
                            binding,
                            namespace: &namespace,
                            name: &name,
                            context: &context,
                        };
                        resource::serve(access, request).await
                    }
                    RouteTarget::Custom(handlers) => {
                        custom::serve(handlers, route.descriptor.name(), &namespace, &name, request)
                            .await
                    }
                    RouteTarget::RawOnly => ApiError::no_route().into_response(),
                }
            }
            Resolution::NotFound => ApiError::no_route().into_response(),
        }
    }

    #[cfg(test)]
    pub(crate) fn resolve(&self, path: &str) -> Resolution {
        self.table.resolve(path)
    }
}

#[cfg(test)]
mod tests;
