use serde::Serialize;

use crate::repositories::clamp_page;

pub(crate) const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
    pub(crate) has_more: bool,
}

impl<T> PaginatedResponse<T> {
    pub(crate) fn new(items: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        let (skip, limit) = clamp_page(skip, limit);
        let has_more = skip + (items.len() as i64) < total_count;
        Self { items, total_count, skip, limit, has_more }
    }
}
