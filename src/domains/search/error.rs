//! Search-specific error types.

use thiserror::Error;

/// Result type for search criteria parsing.
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors raised while decoding search criteria.
///
/// All variants are validation failures: they are detected before any record
/// is fetched or scanned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The criteria argument was not a JSON object.
    #[error("search criteria must be an object mapping field names to criteria")]
    NotAnObject,

    /// The operator is not one of the recognised operators.
    #[error("unknown operator '{operator}' for field '{field}' (expected one of: contains, equals, starts_with, ends_with)")]
    UnknownOperator { field: String, operator: String },

    /// A criterion had a shape that cannot be interpreted.
    #[error("malformed criterion for field '{field}': {reason}")]
    MalformedCriterion { field: String, reason: String },
}

impl SearchError {
    /// Create an "unknown operator" error.
    pub fn unknown_operator(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            field: field.into(),
            operator: operator.into(),
        }
    }

    /// Create a "malformed criterion" error.
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCriterion {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
