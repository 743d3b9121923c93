//! The cursor-pagination contract shared by every query method.

use serde::Serialize;

/// Default page size when a caller has no better idea.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of query results.
///
/// `next` is the internal sequence id to resume from; `None` signals
/// exhaustion. Callers page forward by re-invoking the query with `next`
/// until `None` comes back. An exhaustive forward walk visits every matching
/// row exactly once, in insertion order, even if rows are inserted while the
/// walk is in progress (rows beyond the walk's start point may or may not
/// appear).
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<i64>,
}

impl<T> Page<T> {
    /// An exhausted, empty page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next: None,
        }
    }

    /// Build a page from collected rows.
    ///
    /// `last_id` is the sequence id of the final row; the page advertises a
    /// next cursor only when it is full (a short page proves exhaustion).
    pub(crate) fn from_rows(items: Vec<T>, last_id: Option<i64>, limit: usize) -> Self {
        let next = if items.len() == limit { last_id } else { None };
        Self { items, next }
    }
}
