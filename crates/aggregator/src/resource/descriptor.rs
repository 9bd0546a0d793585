//! Static registration record for one API resource.

use aggregator_types::ApiResource;

use super::binding::{CustomHandlerSet, RawEndpoints, ResourceBinding, StructuredBinding};
use super::hooks::RawHandler;

const DEFAULT_VERBS: [&str; 3] = ["get", "list", "watch"];

/// Describes one resource: identity, scope, discovery metadata and bindings.
///
/// ```ignore
/// let widgets = ResourceDescriptor::new("widgets", "Widget")
///     .namespaced(true)
///     .short_names(["wd"])
///     .structured(StructuredBinding::new(widget_gvr, widget_list_gvr));
/// ```
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    name: String,
    singular_name: String,
    kind: String,
    group: Option<String>,
    version: Option<String>,
    namespaced: bool,
    verbs: Vec<String>,
    short_names: Vec<String>,
    categories: Vec<String>,
    bindings: Vec<ResourceBinding>,
}

impl ResourceDescriptor {
    /// Creates a cluster-scoped descriptor serving `get`, `list` and `watch`.
    /// The singular name defaults to the lower-cased kind.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            name: name.into(),
            singular_name: kind.to_lowercase(),
            kind,
            group: None,
            version: None,
            namespaced: false,
            verbs: DEFAULT_VERBS.iter().map(|verb| (*verb).to_owned()).collect(),
            short_names: Vec::new(),
            categories: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Overrides the singular name.
    pub fn singular_name(mut self, singular_name: impl Into<String>) -> Self {
        self.singular_name = singular_name.into();
        self
    }

    /// Marks the resource as living inside namespaces.
    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    /// Overrides the group advertised in discovery.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Overrides the version advertised in discovery.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Replaces the advertised verb set.
    pub fn verbs<I, S>(mut self, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verbs = verbs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the short names.
    pub fn short_names<I, S>(mut self, short_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.short_names = short_names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the categories.
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a binding.
    pub fn binding(mut self, binding: ResourceBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Appends a structured binding.
    pub fn structured(self, binding: StructuredBinding) -> Self {
        self.binding(ResourceBinding::Structured(binding))
    }

    /// Appends a custom handler set.
    pub fn custom(self, handlers: CustomHandlerSet) -> Self {
        self.binding(ResourceBinding::Custom(handlers))
    }

    /// Appends a single raw endpoint.
    pub fn raw_endpoint(
        self,
        suffix: impl Into<String>,
        handler: impl RawHandler + 'static,
    ) -> Self {
        self.binding(ResourceBinding::RawEndpoints(
            RawEndpoints::new().with(suffix, handler),
        ))
    }

    /// Plural resource name used in paths.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the resource's objects.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether the resource lives inside namespaces.
    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    /// Bindings in registration order.
    pub fn bindings(&self) -> &[ResourceBinding] {
        &self.bindings
    }

    /// Discovery entry for this resource.
    pub fn to_api_resource(&self) -> ApiResource {
        ApiResource {
            name: self.name.clone(),
            singular_name: self.singular_name.clone(),
            namespaced: self.namespaced,
            group: self.group.clone(),
            version: self.version.clone(),
            kind: self.kind.clone(),
            verbs: self.verbs.clone(),
            short_names: self.short_names.clone(),
            categories: self.categories.clone(),
        }
    }
}
