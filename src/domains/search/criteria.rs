//! Search criteria decoding.
//!
//! Criteria arrive as a loosely-typed JSON object:
//!
//! ```json
//! {
//!   "fullname": "nguyen",
//!   "email": { "operator": "ends_with", "value": "@adavigo.com" }
//! }
//! ```
//!
//! They are decoded exactly once, at validation time, into [`SearchCriteria`].

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::error::{SearchError, SearchResult};

/// Comparison operator for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
}

impl Operator {
    /// Wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Equals => "equals",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
        }
    }

    /// Apply the operator. Both sides must already be normalized.
    pub fn apply(&self, haystack: &str, needle: &str) -> bool {
        match self {
            Self::Contains => haystack.contains(needle),
            Self::Equals => haystack == needle,
            Self::StartsWith => haystack.starts_with(needle),
            Self::EndsWith => haystack.ends_with(needle),
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(Self::Contains),
            "equals" => Ok(Self::Equals),
            "starts_with" => Ok(Self::StartsWith),
            "ends_with" => Ok(Self::EndsWith),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A criterion for one field.
///
/// Values are stored case-folded so the matcher compares them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Plain value, equivalent to `contains`.
    Simple(String),
    /// Explicit operator and value.
    WithOperator { operator: Operator, value: String },
}

impl Criterion {
    /// Build a simple (contains) criterion.
    pub fn simple(value: impl AsRef<str>) -> Self {
        Self::Simple(normalize(value.as_ref()))
    }

    /// Build a criterion with an explicit operator.
    pub fn with_operator(operator: Operator, value: impl AsRef<str>) -> Self {
        Self::WithOperator {
            operator,
            value: normalize(value.as_ref()),
        }
    }

    /// Effective operator.
    pub fn operator(&self) -> Operator {
        match self {
            Self::Simple(_) => Operator::Contains,
            Self::WithOperator { operator, .. } => *operator,
        }
    }

    /// Normalized comparison value.
    pub fn value(&self) -> &str {
        match self {
            Self::Simple(value) | Self::WithOperator { value, .. } => value,
        }
    }

    /// Check a raw field text against this criterion.
    pub fn is_satisfied_by(&self, field_text: &str) -> bool {
        self.operator().apply(&normalize(field_text), self.value())
    }

    fn from_json(field: &str, raw: &Value) -> SearchResult<Self> {
        match raw {
            Value::Object(spec) => {
                let operator = match spec.get("operator") {
                    None | Some(Value::Null) => Operator::Contains,
                    Some(Value::String(name)) => name
                        .parse::<Operator>()
                        .map_err(|op| SearchError::unknown_operator(field, op))?,
                    Some(other) => {
                        return Err(SearchError::malformed(
                            field,
                            format!("operator must be a string, got {}", other),
                        ));
                    }
                };
                let value = match spec.get("value") {
                    Some(value) => scalar_text(value).ok_or_else(|| {
                        SearchError::malformed(field, "value must be a string, number or boolean")
                    })?,
                    None => return Err(SearchError::malformed(field, "missing 'value'")),
                };
                Ok(Self::with_operator(operator, value))
            }
            other => scalar_text(other).map(Self::simple).ok_or_else(|| {
                SearchError::malformed(
                    field,
                    "expected a string or an object with 'operator' and 'value'",
                )
            }),
        }
    }
}

/// Parsed, immutable search criteria.
///
/// Entries are kept in the map's key order. An empty set matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    entries: Vec<(String, Criterion)>,
}

impl SearchCriteria {
    /// Criteria that match everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a field criterion, replacing any previous criterion on that field.
    pub fn with(mut self, field: impl Into<String>, criterion: Criterion) -> Self {
        let field = field.into();
        self.entries.retain(|(existing, _)| *existing != field);
        self.entries.push((field, criterion));
        self
    }

    /// Decode criteria from a JSON object.
    pub fn from_map(raw: &Map<String, Value>) -> SearchResult<Self> {
        let entries = raw
            .iter()
            .map(|(field, value)| Ok((field.clone(), Criterion::from_json(field, value)?)))
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Decode criteria from any JSON value; only objects are accepted.
    pub fn from_json(raw: &Value) -> SearchResult<Self> {
        match raw {
            Value::Object(map) => Self::from_map(map),
            _ => Err(SearchError::NotAnObject),
        }
    }

    /// Iterate over `(field, criterion)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.entries.iter().map(|(f, c)| (f.as_str(), c))
    }

    /// Number of field criteria.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no field criteria.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First field whose criterion value is empty, if any.
    pub fn first_empty_value(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, c)| c.value().trim().is_empty())
            .map(|(f, _)| f.as_str())
    }

    /// Human-readable summary, e.g. `fullname contains "nguyen"`.
    pub fn describe(&self) -> String {
        if self.entries.is_empty() {
            return "(no criteria)".to_string();
        }
        self.entries
            .iter()
            .map(|(field, c)| format!("{} {} \"{}\"", field, c.operator(), c.value()))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
