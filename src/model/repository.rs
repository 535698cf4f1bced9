use serde::{Deserialize, Serialize};

use crate::source::RepoId;

/// Owner of a repository (user or organization).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RepositoryOwner {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
}

/// A repository as returned by a search or listing.
///
/// Produced once per response and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RepositorySummary {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: RepositoryOwner,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub releases_url: String,
    #[serde(default)]
    pub updated_at: String,
}

impl RepositorySummary {
    pub fn repo_id(&self) -> RepoId {
        RepoId {
            owner: self.owner.login.clone(),
            repo: self.name.clone(),
        }
    }
}

/// A repository whose latest stable release ships an installer for the
/// platform it was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCandidate(RepositorySummary);

impl VerifiedCandidate {
    /// Only the verifier should call this; it asserts nothing by itself.
    pub(crate) fn new(repo: RepositorySummary) -> Self {
        Self(repo)
    }

    pub fn repo(&self) -> &RepositorySummary {
        &self.0
    }

    pub fn into_inner(self) -> RepositorySummary {
        self.0
    }
}
