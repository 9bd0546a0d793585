//! Watch frame envelope written to streaming responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event type tag of a watch frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchEventType {
    /// Object was created, or is part of the initial state.
    Added,
    /// Object was updated.
    Modified,
    /// Object was removed.
    Deleted,
    /// Progress marker carrying only a resource version.
    Bookmark,
    /// Terminal failure; the object is a `Status`.
    Error,
}

/// One line of a watch stream: `{"type": ..., "object": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchFrame {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: WatchEventType,
    /// Event payload, already transformed.
    pub object: Value,
}

impl WatchFrame {
    /// Builds a frame.
    #[must_use]
    pub const fn new(event_type: WatchEventType, object: Value) -> Self {
        Self { event_type, object }
    }
}
