//! Consumer-side merging of query emissions.

use std::collections::HashMap;

use crate::model::{PaginatedResult, RepositorySummary};

/// Accumulates the emissions of one logical query.
///
/// Repositories are merged by id: a repeated id takes the newest field values
/// in place, a new id is appended. The pagination cursor always comes from
/// the latest emission.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    repos: Vec<RepositorySummary>,
    positions: HashMap<u64, usize>,
    has_more: bool,
    next_page_index: u32,
    total_count: Option<u64>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self {
            next_page_index: 1,
            ..Default::default()
        }
    }

    pub fn apply(&mut self, result: PaginatedResult) {
        for repo in result.repos {
            match self.positions.get(&repo.id) {
                Some(&pos) => self.repos[pos] = repo,
                None => {
                    self.positions.insert(repo.id, self.repos.len());
                    self.repos.push(repo);
                }
            }
        }
        self.has_more = result.has_more;
        self.next_page_index = result.next_page_index;
        if result.total_count.is_some() {
            self.total_count = result.total_count;
        }
    }

    pub fn repos(&self) -> &[RepositorySummary] {
        &self.repos
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn next_page_index(&self) -> u32 {
        self.next_page_index
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn into_repos(self) -> Vec<RepositorySummary> {
        self.repos
    }
}
