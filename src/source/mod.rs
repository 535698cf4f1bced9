//! Remote repository search client abstraction.
//!
//! The discovery pipeline only talks to the code-hosting API through the
//! [`SearchClient`] trait, which keeps it testable with mocks and fakes.

mod github;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::model::{DeveloperProfile, OwnedRepository, Release, RepositorySummary};

pub use github::{DEFAULT_API_URL, GitHubSource};

/// Repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            anyhow::bail!("Invalid repository format. Expected 'owner/repo'.")
        } else {
            Ok(RepoId {
                owner: parts[0].to_string(),
                repo: parts[1].to_string(),
            })
        }
    }
}

/// Sort key of the repository search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Stars,
    Forks,
    Updated,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Stars => "stars",
            SortKey::Forks => "forks",
            SortKey::Updated => "updated",
        }
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stars" => Ok(SortKey::Stars),
            "forks" => Ok(SortKey::Forks),
            "updated" => Ok(SortKey::Updated),
            _ => anyhow::bail!("Unknown sort key: {}. Expected stars, forks, or updated.", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Desc => "desc",
            SortOrder::Asc => "asc",
        }
    }
}

/// One page request against the repository search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// `None` means best match
    pub sort: Option<SortKey>,
    pub order: SortOrder,
    /// 1-based page index
    pub page: u32,
    pub per_page: u32,
}

impl SearchRequest {
    /// The same query at another page.
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    pub total_count: u64,
    pub items: Vec<RepositorySummary>,
}

/// Trait for the remote repository search API.
///
/// Implementations must surface rate limiting as
/// [`crate::http::NonRetryableError::RateLimitExceeded`] so callers can tell
/// it apart with [`crate::http::is_rate_limited`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Fetch one page of repository search results.
    async fn search_repositories(&self, request: &SearchRequest) -> Result<SearchPage>;

    /// Fetch the most recent releases of a repository, newest first.
    async fn list_releases(&self, repo: &RepoId, per_page: u32) -> Result<Vec<Release>>;

    /// Fetch one page of the repositories a user owns, most recently updated first.
    async fn list_user_repositories(
        &self,
        username: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<OwnedRepository>>;

    /// Fetch a user's public profile.
    async fn get_user(&self, username: &str) -> Result<DeveloperProfile>;
}
