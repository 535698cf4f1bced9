use serde::{Deserialize, Serialize};

use super::RepositorySummary;

/// One emission of a query's results.
///
/// A query may emit several of these as verified results accumulate. Only the
/// last emission's `has_more` and `next_page_index` are authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResult {
    pub repos: Vec<RepositorySummary>,
    pub has_more: bool,
    pub next_page_index: u32,
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl PaginatedResult {
    /// Terminal result with nothing to show.
    pub fn empty(next_page_index: u32, total_count: Option<u64>) -> Self {
        Self {
            repos: Vec::new(),
            has_more: false,
            next_page_index,
            total_count,
        }
    }
}
