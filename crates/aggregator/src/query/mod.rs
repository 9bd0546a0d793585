//! Query-parameter semantics shared by list, get, watch and custom routes.
//!
//! Everything here is pure: raw query strings go in, validated
//! [`ListQuery`]/[`WatchQuery`] values come out. Selector parse failures and
//! the `sendInitialEvents` invariant are the only validation errors; every
//! other malformed parameter falls back to its default.

mod errors;
mod fields;
mod labels;
mod options;

pub use self::errors::{QueryError, SelectorError};
pub use self::fields::{FieldOperator, FieldRequirement, FieldSelector, NAME_FIELD};
pub use self::labels::{LabelOperator, LabelRequirement, LabelSelector};
pub use self::options::{
    DEFAULT_LIMIT, DEFAULT_TIMEOUT_SECONDS, ListQuery, MAX_LIMIT, QueryParams,
    ResourceVersionMatch, WatchQuery,
};
