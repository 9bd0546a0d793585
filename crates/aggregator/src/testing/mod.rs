//! In-memory doubles for the backing store.
//!
//! [`ScriptedStore`] serves objects from memory, honours selectors and page
//! limits, records every call and can be told to fail. Watches are driven by
//! hand through the [`WatchScript`] handed out by
//! [`ScriptedStore::script_watch`].

mod store;
mod subscription;

pub use self::store::{ScriptedStore, StoreCall, StoreOperation};
pub use self::subscription::{ScriptedSubscription, WatchScript};
