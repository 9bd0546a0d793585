//! Label selector grammar.
//!
//! Selectors are comma separated requirements:
//!
//! ```text
//! app=web, tier!=cache, env in (prod,staging), !legacy, replicas>2
//! ```
//!
//! Requirements are kept sorted by key so the rendered form is canonical.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::errors::SelectorError;

const MAX_NAME_LENGTH: usize = 63;
const MAX_PREFIX_LENGTH: usize = 253;

/// Relation a requirement applies between a label and its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOperator {
    /// `k=v`
    Equals,
    /// `k==v`
    DoubleEquals,
    /// `k!=v`
    NotEquals,
    /// `k in (a,b)`
    In,
    /// `k notin (a,b)`
    NotIn,
    /// `k`
    Exists,
    /// `!k`
    DoesNotExist,
    /// `k>n`
    GreaterThan,
    /// `k<n`
    LessThan,
}

/// One term of a label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRequirement {
    key: String,
    operator: LabelOperator,
    values: BTreeSet<String>,
}

impl LabelRequirement {
    /// Label key the requirement inspects.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Operator applied to the key.
    #[must_use]
    pub fn operator(&self) -> LabelOperator {
        self.operator
    }

    /// Operand values in sorted order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let actual = labels.get(&self.key);
        match self.operator {
            LabelOperator::Equals | LabelOperator::DoubleEquals | LabelOperator::In => {
                actual.is_some_and(|value| self.values.contains(value))
            }
            LabelOperator::NotEquals | LabelOperator::NotIn => {
                actual.is_none_or(|value| !self.values.contains(value))
            }
            LabelOperator::Exists => actual.is_some(),
            LabelOperator::DoesNotExist => actual.is_none(),
            LabelOperator::GreaterThan | LabelOperator::LessThan => {
                let Some(actual) = actual.and_then(|value| value.parse::<i64>().ok()) else {
                    return false;
                };
                let Some(bound) = self.values.iter().next().and_then(|v| v.parse::<i64>().ok())
                else {
                    return false;
                };
                if self.operator == LabelOperator::GreaterThan {
                    actual > bound
                } else {
                    actual < bound
                }
            }
        }
    }
}

impl fmt::Display for LabelRequirement {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let single = self.values.iter().next().map_or("", String::as_str);
        let joined = || self.values.iter().cloned().collect::<Vec<_>>().join(",");
        match self.operator {
            LabelOperator::Exists => write!(formatter, "{}", self.key),
            LabelOperator::DoesNotExist => write!(formatter, "!{}", self.key),
            LabelOperator::Equals => write!(formatter, "{}={single}", self.key),
            LabelOperator::DoubleEquals => write!(formatter, "{}=={single}", self.key),
            LabelOperator::NotEquals => write!(formatter, "{}!={single}", self.key),
            LabelOperator::GreaterThan => write!(formatter, "{}>{single}", self.key),
            LabelOperator::LessThan => write!(formatter, "{}<{single}", self.key),
            LabelOperator::In => write!(formatter, "{} in ({})", self.key, joined()),
            LabelOperator::NotIn => write!(formatter, "{} notin ({})", self.key, joined()),
        }
    }
}

/// Parsed label selector. The empty selector matches every label set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<LabelRequirement>,
}

impl LabelSelector {
    /// Selector that matches everything.
    #[must_use]
    pub fn everything() -> Self {
        Self::default()
    }

    /// Parses a selector expression.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] when the expression breaks the grammar or a
    /// key or value fails validation.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let tokens = lex(input)?;
        let mut parser = Parser {
            tokens: tokens.into_iter().peekable(),
        };
        let mut requirements = parser.parse()?;
        requirements.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(Self { requirements })
    }

    /// True when the selector has no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Requirements in canonical (key-sorted) order.
    #[must_use]
    pub fn requirements(&self) -> &[LabelRequirement] {
        &self.requirements
    }

    /// Evaluates the selector against a label set.
    #[must_use]
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|requirement| requirement.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
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

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Identifier(String),
    In,
    NotIn,
    Bang,
    Equals,
    DoubleEquals,
    NotEquals,
    GreaterThan,
    LessThan,
    OpenParen,
    CloseParen,
    Comma,
}

impl Token {
    fn literal(&self) -> String {
        match self {
            Self::Identifier(text) => text.clone(),
            Self::In => "in".to_owned(),
            Self::NotIn => "notin".to_owned(),
            Self::Bang => "!".to_owned(),
            Self::Equals => "=".to_owned(),
            Self::DoubleEquals => "==".to_owned(),
            Self::NotEquals => "!=".to_owned(),
            Self::GreaterThan => ">".to_owned(),
            Self::LessThan => "<".to_owned(),
            Self::OpenParen => "(".to_owned(),
            Self::CloseParen => ")".to_owned(),
            Self::Comma => ",".to_owned(),
        }
    }
}

fn is_special(ch: char) -> bool {
    matches!(ch, '!' | '=' | '>' | '<' | '(' | ')' | ',')
}

fn lex(input: &str) -> Result<Vec<Token>, SelectorError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        if !is_special(ch) {
            let mut word = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() || is_special(next) {
                    break;
                }
                word.push(next);
                chars.next();
            }
            tokens.push(match word.as_str() {
                "in" => Token::In,
                "notin" => Token::NotIn,
                _ => Token::Identifier(word),
            });
            continue;
        }
        chars.next();
        let token = match ch {
            '!' if chars.next_if_eq(&'=').is_some() => Token::NotEquals,
            '!' => Token::Bang,
            '=' if chars.next_if_eq(&'=').is_some() => Token::DoubleEquals,
            '=' => Token::Equals,
            '>' => Token::GreaterThan,
            '<' => Token::LessThan,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            ',' => Token::Comma,
            other => return Err(SelectorError::unexpected(other.to_string(), "a token")),
        };
        tokens.push(token);
    }
    Ok(tokens)
}

struct Parser {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
    fn parse(&mut self) -> Result<Vec<LabelRequirement>, SelectorError> {
        let mut requirements = Vec::new();
        if self.tokens.peek().is_none() {
            return Ok(requirements);
        }
        loop {
            requirements.push(self.requirement()?);
            match self.tokens.next() {
                None => return Ok(requirements),
                Some(Token::Comma) => {
                    if !matches!(
                        self.tokens.peek(),
                        Some(Token::Identifier(_) | Token::Bang)
                    ) {
                        let found = self.tokens.peek().map_or_else(String::new, Token::literal);
                        return Err(SelectorError::unexpected(found, "identifier after ','"));
                    }
                }
                Some(other) => {
                    return Err(SelectorError::unexpected(other.literal(), "',' or end of string"));
                }
            }
        }
    }

    fn requirement(&mut self) -> Result<LabelRequirement, SelectorError> {
        if self.tokens.next_if_eq(&Token::Bang).is_some() {
            let key = self.key()?;
            return Ok(requirement(key, LabelOperator::DoesNotExist, BTreeSet::new()));
        }
        let key = self.key()?;
        if matches!(self.tokens.peek(), None | Some(Token::Comma)) {
            return Ok(requirement(key, LabelOperator::Exists, BTreeSet::new()));
        }
        let operator = match self.tokens.next() {
            Some(Token::Equals) => LabelOperator::Equals,
            Some(Token::DoubleEquals) => LabelOperator::DoubleEquals,
            Some(Token::NotEquals) => LabelOperator::NotEquals,
            Some(Token::In) => LabelOperator::In,
            Some(Token::NotIn) => LabelOperator::NotIn,
            Some(Token::GreaterThan) => LabelOperator::GreaterThan,
            Some(Token::LessThan) => LabelOperator::LessThan,
            Some(other) => {
                return Err(SelectorError::unexpected(
                    other.literal(),
                    "=, !=, ==, in, notin, >, <",
                ));
            }
            None => return Err(SelectorError::unexpected("", "an operator")),
        };
        let values = match operator {
            LabelOperator::In | LabelOperator::NotIn => self.value_set(&key)?,
            LabelOperator::GreaterThan | LabelOperator::LessThan => {
                let value = self.single_value()?;
                if value.parse::<i64>().is_err() {
                    return Err(SelectorError::NotInteger { value });
                }
                BTreeSet::from([value])
            }
            _ => BTreeSet::from([self.single_value()?]),
        };
        Ok(requirement(key, operator, values))
    }

    fn key(&mut self) -> Result<String, SelectorError> {
        match self.tokens.next() {
            Some(Token::Identifier(key)) => {
                validate_key(&key)?;
                Ok(key)
            }
            Some(other) => Err(SelectorError::unexpected(other.literal(), "identifier")),
            None => Err(SelectorError::unexpected("", "identifier")),
        }
    }

    fn single_value(&mut self) -> Result<String, SelectorError> {
        match self.tokens.peek() {
            None | Some(Token::Comma) => Ok(String::new()),
            Some(Token::Identifier(_)) => match self.tokens.next() {
                Some(Token::Identifier(value)) => {
                    validate_value(&value)?;
                    Ok(value)
                }
                _ => Ok(String::new()),
            },
            Some(other) => Err(SelectorError::unexpected(other.literal(), "identifier")),
        }
    }

    fn value_set(&mut self, key: &str) -> Result<BTreeSet<String>, SelectorError> {
        match self.tokens.next() {
            Some(Token::OpenParen) => {}
            Some(other) => return Err(SelectorError::unexpected(other.literal(), "'('")),
            None => return Err(SelectorError::unexpected("", "'('")),
        }
        let mut values = BTreeSet::new();
        let mut expect_value = true;
        loop {
            match self.tokens.next() {
                Some(Token::Identifier(value)) if expect_value => {
                    validate_value(&value)?;
                    values.insert(value);
                    expect_value = false;
                }
                Some(Token::Comma) => {
                    if expect_value {
                        values.insert(String::new());
                    }
                    expect_value = true;
                }
                Some(Token::CloseParen) => {
                    if expect_value && !values.is_empty() {
                        values.insert(String::new());
                    }
                    break;
                }
                Some(other) => {
                    return Err(SelectorError::unexpected(other.literal(), "',' or ')'"));
                }
                None => return Err(SelectorError::unexpected("", "')'")),
            }
        }
        if values.is_empty() {
            return Err(SelectorError::EmptyValueSet {
                key: key.to_owned(),
            });
        }
        Ok(values)
    }
}

fn requirement(key: String, operator: LabelOperator, values: BTreeSet<String>) -> LabelRequirement {
    LabelRequirement {
        key,
        operator,
        values,
    }
}

fn validate_key(key: &str) -> Result<(), SelectorError> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };
    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            return Err(SelectorError::invalid_key(key, "prefix part must be non-empty"));
        }
        if prefix.len() > MAX_PREFIX_LENGTH {
            return Err(SelectorError::invalid_key(
                key,
                format!("prefix part must be no more than {MAX_PREFIX_LENGTH} characters"),
            ));
        }
        if !is_dns_subdomain(prefix) {
            return Err(SelectorError::invalid_key(
                key,
                "prefix part must be a lowercase RFC 1123 subdomain",
            ));
        }
    }
    if name.is_empty() {
        return Err(SelectorError::invalid_key(key, "name part must be non-empty"));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(SelectorError::invalid_key(
            key,
            format!("name part must be no more than {MAX_NAME_LENGTH} characters"),
        ));
    }
    if !is_qualified_name(name) {
        return Err(SelectorError::invalid_key(
            key,
            "name part must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
        ));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<(), SelectorError> {
    if value.len() > MAX_NAME_LENGTH {
        return Err(SelectorError::invalid_value(
            value,
            format!("must be no more than {MAX_NAME_LENGTH} characters"),
        ));
    }
    if !value.is_empty() && !is_qualified_name(value) {
        return Err(SelectorError::invalid_value(
            value,
            "a valid label must be an empty string or consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
        ));
    }
    Ok(())
}

fn is_qualified_name(text: &str) -> bool {
    let starts = text.chars().next().is_some_and(|ch| ch.is_ascii_alphanumeric());
    let ends = text.chars().last().is_some_and(|ch| ch.is_ascii_alphanumeric());
    starts
        && ends
        && text
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}

fn is_dns_subdomain(text: &str) -> bool {
    text.split('.').all(|label| {
        let starts = label
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit());
        let ends = label
            .chars()
            .last()
            .is_some_and(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit());
        starts
            && ends
            && label
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
    })
}
