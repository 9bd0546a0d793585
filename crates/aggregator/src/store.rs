//! Interfaces to the backing data source.
//!
//! The server never persists anything itself. [`ResourceStore`] is the
//! trusted, already-authenticated client it forwards reads to, and
//! [`KindResolver`] answers which kind a resource serializes as.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use aggregator_types::{
    DynamicObject, GroupVersionKind, GroupVersionResource, ObjectList, Status, WatchEventType,
};

use crate::query::{ListQuery, WatchQuery};

/// Errors reported by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("{resource} \"{name}\" not found")]
    NotFound { resource: String, name: String },
    /// The requested resource version is no longer available.
    #[error("{message}")]
    Gone { message: String },
    /// Any other backing failure.
    #[error("{message}")]
    Other { message: String },
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(resource: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            name: name.into(),
        }
    }

    /// Creates a gone (expired resource version) error.
    pub fn gone(message: impl Into<String>) -> Self {
        Self::Gone {
            message: message.into(),
        }
    }

    /// Creates a generic backing error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Event delivered by a backing watch.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Object created, or replayed as initial state.
    Added(DynamicObject),
    /// Object updated.
    Modified(DynamicObject),
    /// Object removed.
    Deleted(DynamicObject),
    /// Progress marker carrying only a resource version.
    Bookmark(DynamicObject),
    /// Backing failure; ends the stream.
    Error(Status),
}

impl WatchEvent {
    /// Wire tag of the event.
    #[must_use]
    pub fn event_type(&self) -> WatchEventType {
        match self {
            Self::Added(_) => WatchEventType::Added,
            Self::Modified(_) => WatchEventType::Modified,
            Self::Deleted(_) => WatchEventType::Deleted,
            Self::Bookmark(_) => WatchEventType::Bookmark,
            Self::Error(_) => WatchEventType::Error,
        }
    }
}

/// Live stream of backing watch events.
///
/// The stream ending means the backing side closed the watch. [`stop`] tells
/// the backing side the consumer is gone; the watch translator calls it
/// exactly once per subscription.
///
/// [`stop`]: Subscription::stop
pub trait Subscription: Stream<Item = WatchEvent> + Send + Unpin {
    /// Releases the backing watch.
    fn stop(&mut self);
}

/// Read access to the backing data source.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetches one object.
    async fn get(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, StoreError>;

    /// Lists objects matching `query`.
    async fn list(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        query: &ListQuery,
    ) -> Result<ObjectList, StoreError>;

    /// Opens a watch matching `query`.
    async fn watch(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        query: &WatchQuery,
    ) -> Result<Box<dyn Subscription>, StoreError>;
}

/// Failure to map a resource onto its serialized kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no kind registered for resource {resource}")]
pub struct KindError {
    /// Resource that could not be mapped.
    pub resource: String,
}

/// Maps resources to the kinds their objects serialize as.
#[cfg_attr(test, mockall::automock)]
pub trait KindResolver: Send + Sync {
    /// Resolves the kind for `resource`.
    fn kind_for(&self, resource: &GroupVersionResource) -> Result<GroupVersionKind, KindError>;
}

/// [`KindResolver`] backed by explicit mappings.
#[derive(Debug, Clone, Default)]
pub struct StaticKindResolver {
    kinds: HashMap<GroupVersionResource, GroupVersionKind>,
}

impl StaticKindResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping, builder style.
    #[must_use]
    pub fn with(mut self, resource: GroupVersionResource, kind: GroupVersionKind) -> Self {
        self.insert(resource, kind);
        self
    }

    /// Adds a mapping.
    pub fn insert(&mut self, resource: GroupVersionResource, kind: GroupVersionKind) {
        self.kinds.insert(resource, kind);
    }
}

impl KindResolver for StaticKindResolver {
    fn kind_for(&self, resource: &GroupVersionResource) -> Result<GroupVersionKind, KindError> {
        self.kinds.get(resource).cloned().ok_or_else(|| KindError {
            resource: resource.to_string(),
        })
    }
}
