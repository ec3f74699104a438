//! Record matching and result limiting.

use super::criteria::SearchCriteria;
use super::record::UserRecord;

/// Default number of results returned by a search.
pub const DEFAULT_LIMIT: usize = 20;

/// Upper bound on the number of results returned by a search.
pub const MAX_LIMIT: usize = 100;

/// Clamp a caller-supplied limit to `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

/// Returns `true` if the record satisfies every criterion.
///
/// A missing field fails the match. Evaluation stops at the first failing
/// field.
pub fn matches(record: &UserRecord, criteria: &SearchCriteria) -> bool {
    criteria.iter().all(|(field, criterion)| {
        record
            .field_text(field)
            .is_some_and(|text| criterion.is_satisfied_by(&text))
    })
}

/// All matching records, in input order.
pub fn filter_records<'a>(records: &'a [UserRecord], criteria: &SearchCriteria) -> Vec<&'a UserRecord> {
    records.iter().filter(|r| matches(r, criteria)).collect()
}

/// Keep the first `limit` items.
pub fn truncate<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}

/// Filter then truncate to the clamped limit.
///
/// Returns the total number of matches alongside the kept prefix.
pub fn search(records: Vec<UserRecord>, criteria: &SearchCriteria, limit: usize) -> (usize, Vec<UserRecord>) {
    let limit = clamp_limit(limit);
    let matched: Vec<UserRecord> = records.into_iter().filter(|r| matches(r, criteria)).collect();
    let total = matched.len();
    (total, truncate(matched, limit))
}
