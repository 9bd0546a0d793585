//! Schemaless API objects and lists.
//!
//! The server never interprets resource payloads beyond standard metadata, so
//! objects are kept as JSON maps. Only `apiVersion`, `kind` and a handful of
//! `metadata` fields are read or written.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::GroupVersionKind;

/// A single API object held as an untyped JSON map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicObject {
    fields: Map<String, Value>,
}

impl DynamicObject {
    /// Creates an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an object with `metadata.name` (and optionally
    /// `metadata.namespace`) set.
    #[must_use]
    pub fn named(namespace: &str, name: &str) -> Self {
        let mut object = Self::new();
        object.set_metadata_field("name", name);
        if !namespace.is_empty() {
            object.set_metadata_field("namespace", namespace);
        }
        object
    }

    /// Wraps a JSON value. Returns `None` unless the value is a JSON object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Converts the object back into a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Borrows the underlying JSON map.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Mutable access to the underlying JSON map.
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// True when the object carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Stamps `apiVersion` and `kind`.
    pub fn set_group_version_kind(&mut self, gvk: &GroupVersionKind) {
        self.fields
            .insert("apiVersion".to_owned(), Value::String(gvk.api_version()));
        self.fields
            .insert("kind".to_owned(), Value::String(gvk.kind.clone()));
    }

    /// The `apiVersion` field, if present.
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.fields.get("apiVersion").and_then(Value::as_str)
    }

    /// The `kind` field, if present.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.fields.get("kind").and_then(Value::as_str)
    }

    /// `metadata.name`, or an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata_str("name")
    }

    /// `metadata.namespace`, or an empty string.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.metadata_str("namespace")
    }

    /// `metadata.resourceVersion`, or an empty string.
    #[must_use]
    pub fn resource_version(&self) -> &str {
        self.metadata_str("resourceVersion")
    }

    /// Sets `metadata.resourceVersion`.
    pub fn set_resource_version(&mut self, resource_version: &str) {
        self.set_metadata_field("resourceVersion", resource_version);
    }

    /// `metadata.labels` as a sorted map. Non-string values are skipped.
    #[must_use]
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.metadata()
            .and_then(|metadata| metadata.get("labels"))
            .and_then(Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(key, value)| {
                        value.as_str().map(|text| (key.clone(), text.to_owned()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sets a single entry in `metadata.labels`.
    pub fn set_label(&mut self, key: &str, value: &str) {
        self.update_metadata(|metadata| {
            let labels = metadata
                .entry("labels")
                .or_insert_with(|| Value::Object(Map::new()));
            if !labels.is_object() {
                *labels = Value::Object(Map::new());
            }
            if let Value::Object(labels) = labels {
                labels.insert(key.to_owned(), Value::String(value.to_owned()));
            }
        });
    }

    /// Field values addressable by a field selector: `metadata.name` and
    /// `metadata.namespace`.
    #[must_use]
    pub fn selectable_fields(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("metadata.name".to_owned(), self.name().to_owned()),
            ("metadata.namespace".to_owned(), self.namespace().to_owned()),
        ])
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.fields.get("metadata").and_then(Value::as_object)
    }

    fn update_metadata(&mut self, update: impl FnOnce(&mut Map<String, Value>)) {
        let mut metadata = match self.fields.remove("metadata") {
            Some(Value::Object(metadata)) => metadata,
            _ => Map::new(),
        };
        update(&mut metadata);
        self.fields
            .insert("metadata".to_owned(), Value::Object(metadata));
    }

    fn metadata_str(&self, key: &str) -> &str {
        self.metadata()
            .and_then(|metadata| metadata.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    fn set_metadata_field(&mut self, key: &str, value: &str) {
        self.update_metadata(|metadata| {
            metadata.insert(key.to_owned(), Value::String(value.to_owned()));
        });
    }
}

/// List-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    /// Consistency token of the list snapshot.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,
    /// Opaque token for fetching the next page.
    #[serde(
        default,
        rename = "continue",
        skip_serializing_if = "String::is_empty"
    )]
    pub continue_token: String,
    /// Estimated number of items not yet returned, when paginating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_item_count: Option<i64>,
}

/// A list of objects as returned by list requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList {
    /// `apiVersion` of the list kind.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    /// List kind, e.g. `WidgetList`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// List metadata.
    #[serde(default)]
    pub metadata: ListMeta,
    /// The listed objects.
    #[serde(default)]
    pub items: Vec<DynamicObject>,
}

impl ObjectList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding `items`.
    #[must_use]
    pub fn with_items(items: Vec<DynamicObject>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Stamps the list's own `apiVersion` and `kind`.
    pub fn set_group_version_kind(&mut self, gvk: &GroupVersionKind) {
        self.api_version = gvk.api_version();
        self.kind = gvk.kind.clone();
    }

    /// Stamps every item with `gvk`.
    pub fn set_item_group_version_kind(&mut self, gvk: &GroupVersionKind) {
        for item in &mut self.items {
            item.set_group_version_kind(gvk);
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the list holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
