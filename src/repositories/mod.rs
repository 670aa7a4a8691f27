pub(crate) mod complaints;
pub(crate) mod health;
pub(crate) mod users;

pub(crate) const MAX_PAGE_LIMIT: i64 = 1000;

/// Clamps client paging to a non-negative offset and `1..=MAX_PAGE_LIMIT` rows.
pub(crate) fn clamp_page(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(1, MAX_PAGE_LIMIT))
}
