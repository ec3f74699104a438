//! Search domain module.
//!
//! Flexible, multi-field filtering over loosely-typed user records.
//!
//! ## Architecture
//!
//! - `record.rs` - `UserRecord`, a field map with string projection
//! - `criteria.rs` - `SearchCriteria` parsed once from raw JSON arguments
//! - `matcher.rs` - AND-combined evaluation, ordering and limit handling
//! - `error.rs` - Validation errors for malformed criteria
//!
//! The matcher is purely computational: it never performs I/O and never
//! re-inspects raw JSON once criteria have been parsed.

mod criteria;
mod error;
mod matcher;
mod record;

pub use criteria::{Criterion, Operator, SearchCriteria};
pub use error::{SearchError, SearchResult};
pub use matcher::{
    DEFAULT_LIMIT, MAX_LIMIT, clamp_limit, filter_records, matches, search, truncate,
};
pub use record::UserRecord;
