//! In-memory [`ResourceStore`] with call recording and failure injection.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use aggregator_types::{DynamicObject, GroupVersionResource, ObjectList};

use crate::query::{ListQuery, WatchQuery};
use crate::store::{ResourceStore, StoreError, Subscription};

use super::subscription::{ScriptedSubscription, WatchScript};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// [`ResourceStore::get`].
    Get,
    /// [`ResourceStore::list`].
    List,
    /// [`ResourceStore::watch`].
    Watch,
}

/// A recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// A get for `name` in `namespace`.
    Get {
        resource: GroupVersionResource,
        namespace: String,
        name: String,
    },
    /// A list with the options the dispatcher built.
    List {
        resource: GroupVersionResource,
        namespace: String,
        query: ListQuery,
    },
    /// A watch with the options the dispatcher built.
    Watch {
        resource: GroupVersionResource,
        namespace: String,
        query: WatchQuery,
    },
}

#[derive(Default)]
struct StoreState {
    objects: Vec<(GroupVersionResource, DynamicObject)>,
    list_resource_version: String,
    failures: HashMap<StoreOperation, StoreError>,
    watches: VecDeque<ScriptedSubscription>,
    calls: Vec<StoreCall>,
}

/// Cloneable in-memory backing store. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    state: Arc<Mutex<StoreState>>,
}

impl ScriptedStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `object` under `resource`.
    pub fn insert(&self, resource: &GroupVersionResource, object: DynamicObject) {
        self.state().objects.push((resource.clone(), object));
    }

    /// Sets the resource version reported on list responses.
    pub fn set_list_resource_version(&self, resource_version: &str) {
        resource_version.clone_into(&mut self.state().list_resource_version);
    }

    /// Makes every later call of `operation` fail with `error`.
    pub fn fail(&self, operation: StoreOperation, error: StoreError) {
        self.state().failures.insert(operation, error);
    }

    /// Queues a hand-driven subscription for the next watch call.
    ///
    /// Watches opened without a queued script end immediately.
    #[must_use]
    pub fn script_watch(&self) -> WatchScript {
        let (script, subscription) = WatchScript::new();
        self.state().watches.push_back(subscription);
        script
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Most recent list options, if any list was issued.
    #[must_use]
    pub fn last_list_query(&self) -> Option<ListQuery> {
        self.state().calls.iter().rev().find_map(|call| match call {
            StoreCall::List { query, .. } => Some(query.clone()),
            _ => None,
        })
    }

    /// Most recent watch options, if any watch was opened.
    #[must_use]
    pub fn last_watch_query(&self) -> Option<WatchQuery> {
        self.state().calls.iter().rev().find_map(|call| match call {
            StoreCall::Watch { query, .. } => Some(query.clone()),
            _ => None,
        })
    }

    fn failure(&self, operation: StoreOperation, call: StoreCall) -> Option<StoreError> {
        let mut state = self.state();
        state.calls.push(call);
        state.failures.get(&operation).cloned()
    }
}

fn in_scope(
    stored: &(GroupVersionResource, DynamicObject),
    resource: &GroupVersionResource,
    namespace: &str,
) -> bool {
    let (stored_resource, object) = stored;
    stored_resource == resource && (namespace.is_empty() || object.namespace() == namespace)
}

fn offset(continue_token: &str) -> usize {
    continue_token.parse().unwrap_or(0)
}

#[async_trait]
impl ResourceStore for ScriptedStore {
    async fn get(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, StoreError> {
        let call = StoreCall::Get {
            resource: resource.clone(),
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        };
        if let Some(error) = self.failure(StoreOperation::Get, call) {
            return Err(error);
        }
        self.state()
            .objects
            .iter()
            .find(|stored| in_scope(stored, resource, namespace) && stored.1.name() == name)
            .map(|(_, object)| object.clone())
            .ok_or_else(|| StoreError::not_found(&resource.resource, name))
    }

    async fn list(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        query: &ListQuery,
    ) -> Result<ObjectList, StoreError> {
        let call = StoreCall::List {
            resource: resource.clone(),
            namespace: namespace.to_owned(),
            query: query.clone(),
        };
        if let Some(error) = self.failure(StoreOperation::List, call) {
            return Err(error);
        }

        let state = self.state();
        let matching: Vec<DynamicObject> = state
            .objects
            .iter()
            .filter(|stored| in_scope(stored, resource, namespace))
            .map(|(_, object)| object)
            .filter(|object| query.label_selector.matches(&object.labels()))
            .filter(|object| query.field_selector.matches(&object.selectable_fields()))
            .cloned()
            .collect();

        let start = offset(&query.continue_token).min(matching.len());
        let page = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let end = start.saturating_add(page).min(matching.len());
        let mut list = ObjectList::with_items(matching[start..end].to_vec());
        list.metadata.resource_version = state.list_resource_version.clone();
        if end < matching.len() {
            list.metadata.continue_token = end.to_string();
            list.metadata.remaining_item_count = i64::try_from(matching.len() - end).ok();
        }
        Ok(list)
    }

    async fn watch(
        &self,
        resource: &GroupVersionResource,
        namespace: &str,
        query: &WatchQuery,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        let call = StoreCall::Watch {
            resource: resource.clone(),
            namespace: namespace.to_owned(),
            query: query.clone(),
        };
        if let Some(error) = self.failure(StoreOperation::Watch, call) {
            return Err(error);
        }
        let subscription = self
            .state()
            .watches
            .pop_front()
            .unwrap_or_else(|| ScriptedSubscription::replaying([]).0);
        Ok(Box::new(subscription))
    }
}
