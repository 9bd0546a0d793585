//! List and watch options derived from request query parameters.

use std::fmt;

use url::form_urlencoded;

use super::errors::QueryError;
use super::fields::FieldSelector;
use super::labels::LabelSelector;

/// Page size used when `limit` is absent or unusable.
pub const DEFAULT_LIMIT: i64 = 500;
/// Upper bound on the page size.
pub const MAX_LIMIT: i64 = 1000;
/// Watch timeout used when `timeoutSeconds` is absent or unusable.
pub const DEFAULT_TIMEOUT_SECONDS: i64 = 60;

/// Decoded query string. Repeated keys keep their first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decodes a raw (still percent-encoded) query string.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    /// First value supplied for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// First value for `key`, or the empty string.
    #[must_use]
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Case-insensitive comparison of `key` with `"true"`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    /// Whether the request asks for a watch stream.
    #[must_use]
    pub fn is_watch(&self) -> bool {
        self.flag("watch")
    }
}

/// Consistency policy applied to `resourceVersion`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResourceVersionMatch {
    /// Serve exactly the requested version.
    Exact,
    /// Serve any version at least as new as the requested one.
    #[default]
    NotOlderThan,
}

impl ResourceVersionMatch {
    /// Recognises `Exact` and `NotOlderThan`; everything else is the default.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Exact" => Self::Exact,
            _ => Self::NotOlderThan,
        }
    }

    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::NotOlderThan => "NotOlderThan",
        }
    }
}

impl fmt::Display for ResourceVersionMatch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Options for a list call against the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Page size in `[1, MAX_LIMIT]`.
    pub limit: i64,
    /// Opaque pagination token.
    pub continue_token: String,
    /// Parsed label selector.
    pub label_selector: LabelSelector,
    /// Parsed field selector.
    pub field_selector: FieldSelector,
    /// Opaque consistency token.
    pub resource_version: String,
    /// Policy applied to `resource_version`.
    pub resource_version_match: ResourceVersionMatch,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            continue_token: String::new(),
            label_selector: LabelSelector::everything(),
            field_selector: FieldSelector::everything(),
            resource_version: String::new(),
            resource_version_match: ResourceVersionMatch::default(),
        }
    }
}

impl ListQuery {
    /// Builds list options from query parameters.
    ///
    /// A non-empty `name` (taken from the request path) replaces any
    /// client-supplied field selector with `metadata.name=<name>`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when either selector fails to parse.
    pub fn parse(params: &QueryParams, name: &str) -> Result<Self, QueryError> {
        let label_selector = LabelSelector::parse(params.get_or_empty("labelSelector"))
            .map_err(|source| QueryError::LabelSelector { source })?;
        let field_selector = if name.is_empty() {
            FieldSelector::parse(params.get_or_empty("fieldSelector"))
                .map_err(|source| QueryError::FieldSelector { source })?
        } else {
            FieldSelector::for_name(name)
        };

        Ok(Self {
            limit: parse_limit(params.get("limit")),
            continue_token: params.get_or_empty("continue").to_owned(),
            label_selector,
            field_selector,
            resource_version: params.get_or_empty("resourceVersion").to_owned(),
            resource_version_match: ResourceVersionMatch::parse(
                params.get_or_empty("resourceVersionMatch"),
            ),
        })
    }
}

/// Missing, malformed and non-positive limits fall back to [`DEFAULT_LIMIT`].
/// Limits above [`MAX_LIMIT`] are clamped to it instead, so a client asking
/// for a huge page gets the largest page rather than the default one.
fn parse_limit(raw: Option<&str>) -> i64 {
    match raw.and_then(|value| value.trim().parse::<i64>().ok()) {
        Some(limit) if limit > 0 => limit.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

fn parse_timeout(raw: Option<&str>) -> i64 {
    match raw.and_then(|value| value.trim().parse::<i64>().ok()) {
        Some(seconds) if seconds > 0 => seconds,
        _ => DEFAULT_TIMEOUT_SECONDS,
    }
}

/// Options for opening a watch against the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchQuery {
    /// Selectors, resource version and match policy shared with lists.
    pub list: ListQuery,
    /// Forward bookmark events to the client.
    pub allow_watch_bookmarks: bool,
    /// Replay current state as `ADDED` events before live changes.
    pub send_initial_events: bool,
    /// Server-side lifetime requested for the watch.
    pub timeout_seconds: i64,
}

impl WatchQuery {
    /// Builds watch options from query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InitialEventsRequireNotOlderThan`] when initial
    /// events are requested with `resourceVersionMatch=Exact`, and
    /// [`QueryError`] selector variants for malformed selectors.
    pub fn parse(params: &QueryParams, name: &str) -> Result<Self, QueryError> {
        let list = ListQuery::parse(params, name)?;
        let send_initial_events = match params.get("sendInitialEvents") {
            Some(raw) if !raw.is_empty() => raw.eq_ignore_ascii_case("true"),
            _ => list.resource_version.is_empty() || list.resource_version == "0",
        };
        if send_initial_events && list.resource_version_match != ResourceVersionMatch::NotOlderThan
        {
            return Err(QueryError::InitialEventsRequireNotOlderThan);
        }

        Ok(Self {
            allow_watch_bookmarks: params.flag("allowWatchBookmarks"),
            send_initial_events,
            timeout_seconds: parse_timeout(params.get("timeoutSeconds")),
            list,
        })
    }
}
