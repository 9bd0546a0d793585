//! Field selector grammar: `field=value`, `field==value` and
//! `field!=value` terms joined by commas. Backslash escapes `\`, `,`, `=` and
//! `!` inside values.

use std::collections::BTreeMap;
use std::fmt;

use super::errors::SelectorError;

/// Field holding an object's name.
pub const NAME_FIELD: &str = "metadata.name";

/// Comparison applied by a field requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOperator {
    /// `=`
    Equals,
    /// `==`
    DoubleEquals,
    /// `!=`
    NotEquals,
}

impl FieldOperator {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::DoubleEquals => "==",
            Self::NotEquals => "!=",
        }
    }
}

// Longest operators first so `!=` and `==` win over `=` at the same offset.
const OPERATORS: [FieldOperator; 3] = [
    FieldOperator::NotEquals,
    FieldOperator::DoubleEquals,
    FieldOperator::Equals,
];

/// One `field <op> value` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    field: String,
    operator: FieldOperator,
    value: String,
}

impl FieldRequirement {
    /// Field path, e.g. `metadata.name`.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Comparison operator.
    #[must_use]
    pub fn operator(&self) -> FieldOperator {
        self.operator
    }

    /// Unescaped operand.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    fn matches(&self, fields: &BTreeMap<String, String>) -> bool {
        let actual = fields.get(&self.field).map_or("", String::as_str);
        match self.operator {
            FieldOperator::Equals | FieldOperator::DoubleEquals => actual == self.value,
            FieldOperator::NotEquals => actual != self.value,
        }
    }
}

impl fmt::Display for FieldRequirement {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}{}{}",
            self.field,
            self.operator.symbol(),
            escape_value(&self.value)
        )
    }
}

/// Parsed field selector. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<FieldRequirement>,
}

impl FieldSelector {
    /// Selector that matches everything.
    #[must_use]
    pub fn everything() -> Self {
        Self::default()
    }

    /// Selector that matches exactly `field=value`.
    #[must_use]
    pub fn one_term_equal(field: &str, value: &str) -> Self {
        Self {
            requirements: vec![FieldRequirement {
                field: field.to_owned(),
                operator: FieldOperator::Equals,
                value: value.to_owned(),
            }],
        }
    }

    /// Selector pinning `metadata.name`.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        Self::one_term_equal(NAME_FIELD, name)
    }

    /// Parses a selector expression.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for a term without an operator or with a
    /// malformed escape sequence.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut requirements = Vec::new();
        for term in split_terms(input) {
            if term.is_empty() {
                continue;
            }
            requirements.push(parse_term(&term)?);
        }
        Ok(Self { requirements })
    }

    /// True when the selector has no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Requirements in source order.
    #[must_use]
    pub fn requirements(&self) -> &[FieldRequirement] {
        &self.requirements
    }

    /// Returns the value `field` must equal, if some term pins it exactly.
    #[must_use]
    pub fn requires_exact_match(&self, field: &str) -> Option<&str> {
        self.requirements
            .iter()
            .find(|requirement| {
                requirement.field == field && requirement.operator != FieldOperator::NotEquals
            })
            .map(FieldRequirement::value)
    }

    /// Evaluates the selector against a field set; absent fields compare as
    /// empty strings.
    #[must_use]
    pub fn matches(&self, fields: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|requirement| requirement.matches(fields))
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, requirement) in self.requirements.iter().enumerate() {
            if index > 0 {
                formatter.write_str(",")?;
            }
            write!(formatter, "{requirement}")?;
        }
        Ok(())
    }
}

/// Splits on commas that are not preceded by an escaping backslash. Terms keep
/// their escapes so the operator search can skip escaped characters.
fn split_terms(input: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            ',' => terms.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    terms.push(current);
    terms
}

fn parse_term(term: &str) -> Result<FieldRequirement, SelectorError> {
    let mut escaped = false;
    for (offset, ch) in term.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        let rest = term.get(offset..).unwrap_or_default();
        let Some(operator) = OPERATORS
            .into_iter()
            .find(|operator| rest.starts_with(operator.symbol()))
        else {
            continue;
        };
        let field = term.get(..offset).unwrap_or_default();
        let raw_value = rest.get(operator.symbol().len()..).unwrap_or_default();
        return Ok(FieldRequirement {
            field: field.trim().to_owned(),
            operator,
            value: unescape_value(term, raw_value)?,
        });
    }
    Err(SelectorError::MissingOperator {
        term: term.to_owned(),
    })
}

fn unescape_value(term: &str, raw: &str) -> Result<String, SelectorError> {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('\\' | ',' | '=' | '!')) => value.push(next),
            _ => {
                return Err(SelectorError::InvalidEscape {
                    term: term.to_owned(),
                });
            }
        }
    }
    Ok(value)
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | ',' | '=') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
