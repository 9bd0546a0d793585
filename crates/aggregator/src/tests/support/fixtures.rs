//! Shared resource fixtures: a namespaced `widgets` resource in
//! `example.com/v1` backed by a [`ScriptedStore`].

use std::sync::Arc;

use aggregator_types::{DynamicObject, GroupVersion, GroupVersionResource};

use crate::dispatch::{Router, RouterBuilder};
use crate::resource::{ResourceDescriptor, StructuredBinding};
use crate::store::StaticKindResolver;
use crate::testing::ScriptedStore;

pub fn group_version() -> GroupVersion {
    GroupVersion::new("example.com", "v1")
}

pub fn widgets() -> GroupVersionResource {
    group_version().with_resource("widgets")
}

pub fn widget_lists() -> GroupVersionResource {
    group_version().with_resource("widgetlists")
}

/// Resolver knowing `Widget` and `WidgetList`.
pub fn kinds() -> StaticKindResolver {
    StaticKindResolver::new()
        .with(widgets(), group_version().with_kind("Widget"))
        .with(widget_lists(), group_version().with_kind("WidgetList"))
}

pub fn widget_binding() -> StructuredBinding {
    StructuredBinding::new(widgets(), widget_lists())
}

pub fn widget_descriptor() -> ResourceDescriptor {
    ResourceDescriptor::new("widgets", "Widget")
        .namespaced(true)
        .short_names(["wd"])
        .structured(widget_binding())
}

/// A widget with a resource version and a `tier` label.
pub fn widget(namespace: &str, name: &str, tier: &str) -> DynamicObject {
    let mut object = DynamicObject::named(namespace, name);
    object.set_resource_version("10");
    object.set_label("tier", tier);
    object
}

/// Builds a router over `descriptors` backed by `store` and [`kinds`].
pub fn router_with(
    store: &ScriptedStore,
    descriptors: impl IntoIterator<Item = ResourceDescriptor>,
) -> Router {
    RouterBuilder::new(group_version())
        .resources(descriptors)
        .build(Arc::new(store.clone()), Arc::new(kinds()))
        .expect("router should build")
}
