//! Error types for query-parameter and selector parsing.

use thiserror::Error;

/// Errors raised while parsing a label or field selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The lexer produced a token the grammar does not allow here.
    #[error("found '{found}', expected: {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
    },
    /// A label key is not a valid qualified name.
    #[error("invalid label key \"{key}\": {reason}")]
    InvalidKey { key: String, reason: String },
    /// A label value breaks the label value grammar.
    #[error("invalid label value: \"{value}\": {reason}")]
    InvalidValue { value: String, reason: String },
    /// `in`/`notin` with an empty value set.
    #[error("for 'in', 'notin' operators, values set can't be empty")]
    EmptyValueSet { key: String },
    /// `>`/`<` with a non-integer operand.
    #[error("for 'Gt', 'Lt' operators, the value must be an integer: \"{value}\"")]
    NotInteger { value: String },
    /// A field selector term carries no operator.
    #[error("invalid selector: '{term}'; can't understand '{term}'")]
    MissingOperator { term: String },
    /// A field selector value contains an unsupported escape.
    #[error("invalid field selector: invalid escape sequence in '{term}'")]
    InvalidEscape { term: String },
}

impl SelectorError {
    pub(crate) fn unexpected(found: impl Into<String>, expected: &'static str) -> Self {
        Self::UnexpectedToken {
            found: found.into(),
            expected,
        }
    }

    pub(crate) fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_value(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Validation errors surfaced while turning query parameters into options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// `labelSelector` failed to parse.
    #[error("failed to parse labelSelector: {source}")]
    LabelSelector {
        #[source]
        source: SelectorError,
    },
    /// `fieldSelector` failed to parse.
    #[error("failed to parse fieldSelector: {source}")]
    FieldSelector {
        #[source]
        source: SelectorError,
    },
    /// `sendInitialEvents=true` combined with a non-default match policy.
    #[error("sendInitialEvents requires resourceVersionMatch=NotOlderThan")]
    InitialEventsRequireNotOlderThan,
}
