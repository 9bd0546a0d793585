//! Wire types shared by the aggregation server and its clients.
//!
//! The server treats resource payloads as opaque JSON documents, so this crate
//! only models identities, the object/list envelopes, discovery documents,
//! watch frames and the failure `Status` payload.

mod discovery;
mod identity;
mod object;
mod status;
mod watch;

pub use discovery::{
    ApiGroup, ApiGroupList, ApiResource, ApiResourceList, GroupVersionForDiscovery,
};
pub use identity::{GroupVersion, GroupVersionKind, GroupVersionResource};
pub use object::{DynamicObject, ListMeta, ObjectList};
pub use status::Status;
pub use watch::{WatchEventType, WatchFrame};
