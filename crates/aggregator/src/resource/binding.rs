//! Behaviour bindings attached to a resource descriptor.

use std::fmt;
use std::sync::Arc;

use aggregator_types::{GroupVersionResource, ObjectList};

use super::hooks::{CustomHandler, ListTransform, RawHandler, WatchTransform};

/// How requests for a resource are served.
#[derive(Clone)]
pub enum ResourceBinding {
    /// Raw handlers keyed by path suffix.
    RawEndpoints(RawEndpoints),
    /// Get/List/Watch against the backing store.
    Structured(StructuredBinding),
    /// Per-verb callbacks.
    Custom(CustomHandlerSet),
}

impl fmt::Debug for ResourceBinding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawEndpoints(raw) => formatter
                .debug_tuple("RawEndpoints")
                .field(&raw.suffixes().collect::<Vec<_>>())
                .finish(),
            Self::Structured(binding) => formatter
                .debug_tuple("Structured")
                .field(&binding.resource().to_string())
                .finish(),
            Self::Custom(set) => formatter
                .debug_tuple("Custom")
                .field(&set.verbs().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Raw endpoint handlers, served at `/apis/{group}/{version}/{resource}{suffix}`.
#[derive(Clone, Default)]
pub struct RawEndpoints {
    endpoints: Vec<(String, Arc<dyn RawHandler>)>,
}

impl RawEndpoints {
    /// Creates an empty endpoint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler at `suffix` (empty, or starting with `/`).
    pub fn with(mut self, suffix: impl Into<String>, handler: impl RawHandler + 'static) -> Self {
        self.endpoints.push((suffix.into(), Arc::new(handler)));
        self
    }

    /// Registered suffixes in insertion order.
    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|(suffix, _)| suffix.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn RawHandler>)> {
        self.endpoints
            .iter()
            .map(|(suffix, handler)| (suffix.as_str(), handler))
    }
}

/// Structured Get/List/Watch binding.
#[derive(Clone)]
pub struct StructuredBinding {
    resource: GroupVersionResource,
    list_resource: GroupVersionResource,
    list_transform: Option<Arc<dyn ListTransform>>,
    watch_transform: Option<Arc<dyn WatchTransform>>,
}

impl StructuredBinding {
    /// Binds `resource`; `list_resource` names the identity its list kind is
    /// resolved from.
    pub fn new(resource: GroupVersionResource, list_resource: GroupVersionResource) -> Self {
        Self {
            resource,
            list_resource,
            list_transform: None,
            watch_transform: None,
        }
    }

    /// Installs the list (and get) transform.
    pub fn with_list_transform(mut self, hook: impl ListTransform + 'static) -> Self {
        self.list_transform = Some(Arc::new(hook));
        self
    }

    /// Installs the watch transform.
    pub fn with_watch_transform(mut self, hook: impl WatchTransform + 'static) -> Self {
        self.watch_transform = Some(Arc::new(hook));
        self
    }

    /// Identity used for store calls and object kind resolution.
    pub fn resource(&self) -> &GroupVersionResource {
        &self.resource
    }

    /// Identity used for list kind resolution.
    pub fn list_resource(&self) -> &GroupVersionResource {
        &self.list_resource
    }

    /// Empty list instance.
    pub fn new_list(&self) -> ObjectList {
        ObjectList::new()
    }

    pub(crate) fn list_transform(&self) -> Option<&Arc<dyn ListTransform>> {
        self.list_transform.as_ref()
    }

    pub(crate) fn watch_transform(&self) -> Option<&Arc<dyn WatchTransform>> {
        self.watch_transform.as_ref()
    }
}

/// Verbs a custom handler set can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomVerb {
    /// `POST`
    Create,
    /// `GET` with a name.
    Get,
    /// `GET` without a name.
    List,
    /// `PUT`
    Replace,
    /// `DELETE`
    Delete,
    /// `GET` with `watch=true`.
    Watch,
}

impl CustomVerb {
    /// Lower-case verb name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::List => "list",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Watch => "watch",
        }
    }
}

impl fmt::Display for CustomVerb {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Callbacks for a resource served entirely by caller code.
#[derive(Clone, Default)]
pub struct CustomHandlerSet {
    create: Option<Arc<dyn CustomHandler>>,
    get: Option<Arc<dyn CustomHandler>>,
    list: Option<Arc<dyn CustomHandler>>,
    replace: Option<Arc<dyn CustomHandler>>,
    delete: Option<Arc<dyn CustomHandler>>,
    watch: Option<Arc<dyn CustomHandler>>,
}

impl CustomHandlerSet {
    /// Creates a set with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the callback for `verb`.
    pub fn on(mut self, verb: CustomVerb, handler: impl CustomHandler + 'static) -> Self {
        *self.slot_mut(verb) = Some(Arc::new(handler));
        self
    }

    /// Callback registered for `verb`.
    pub fn handler(&self, verb: CustomVerb) -> Option<&Arc<dyn CustomHandler>> {
        match verb {
            CustomVerb::Create => self.create.as_ref(),
            CustomVerb::Get => self.get.as_ref(),
            CustomVerb::List => self.list.as_ref(),
            CustomVerb::Replace => self.replace.as_ref(),
            CustomVerb::Delete => self.delete.as_ref(),
            CustomVerb::Watch => self.watch.as_ref(),
        }
    }

    /// Verbs with a registered callback.
    pub fn verbs(&self) -> impl Iterator<Item = CustomVerb> + '_ {
        [
            CustomVerb::Create,
            CustomVerb::Get,
            CustomVerb::List,
            CustomVerb::Replace,
            CustomVerb::Delete,
            CustomVerb::Watch,
        ]
        .into_iter()
        .filter(|verb| self.handler(*verb).is_some())
    }

    fn slot_mut(&mut self, verb: CustomVerb) -> &mut Option<Arc<dyn CustomHandler>> {
        match verb {
            CustomVerb::Create => &mut self.create,
            CustomVerb::Get => &mut self.get,
            CustomVerb::List => &mut self.list,
            CustomVerb::Replace => &mut self.replace,
            CustomVerb::Delete => &mut self.delete,
            CustomVerb::Watch => &mut self.watch,
        }
    }
}
