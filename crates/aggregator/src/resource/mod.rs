//! Resource descriptors, bindings and caller-supplied hooks.
//!
//! A [`ResourceDescriptor`] is registered once with the
//! [`RouterBuilder`](crate::RouterBuilder) and never changes afterwards. Its
//! bindings decide how requests are served: [`StructuredBinding`] goes through
//! the backing store, [`CustomHandlerSet`] hands each verb to caller code, and
//! [`RawEndpoints`] expose extra paths verbatim.

mod binding;
mod descriptor;
mod hooks;

pub use self::binding::{
    CustomHandlerSet, CustomVerb, RawEndpoints, ResourceBinding, StructuredBinding,
};
pub use self::descriptor::ResourceDescriptor;
pub use self::hooks::{
    CustomHandler, HookError, ListTransform, RawHandler, WatchTransform,
};
