//! Pre-computed discovery snapshots.
//!
//! The first page of a discovery category may be served from a static JSON
//! document. Any failure to load one falls back to the live query silently.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use super::query::DiscoveryCategory;
use crate::http::HttpClient;
use crate::model::{PaginatedResult, RepositorySummary};
use crate::platform::Platform;

pub const DEFAULT_SNAPSHOT_URL: &str =
    "https://raw.githubusercontent.com/OpenHub-Store/api/refs/heads/main/cached-data";

/// Page index reported after serving a snapshot.
pub const SNAPSHOT_NEXT_PAGE: u32 = 2;

/// Transport for snapshot documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch a document; `Ok(None)` when it does not exist.
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>>;
}

/// Snapshot source over HTTP.
pub struct HttpSnapshotSource {
    http_client: HttpClient,
}

impl HttpSnapshotSource {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.http_client.get_optional_bytes(url).await
    }
}

/// Snapshot document types (internal).
mod document {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Snapshot {
        #[serde(default)]
        pub platform: String,
        #[serde(default)]
        pub last_updated: Option<String>,
        #[serde(default)]
        pub total_count: Option<u64>,
        #[serde(default)]
        pub repositories: Vec<Repository>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Repository {
        pub id: u64,
        pub name: String,
        pub full_name: String,
        pub owner: Owner,
        pub description: Option<String>,
        #[serde(default)]
        pub default_branch: String,
        #[serde(default)]
        pub html_url: String,
        #[serde(default)]
        pub stargazers_count: u64,
        #[serde(default)]
        pub forks_count: u64,
        pub language: Option<String>,
        #[serde(default)]
        pub topics: Vec<String>,
        #[serde(default)]
        pub releases_url: String,
        #[serde(default)]
        pub updated_at: String,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Owner {
        pub id: u64,
        pub login: String,
        #[serde(default)]
        pub avatar_url: String,
        #[serde(default)]
        pub html_url: String,
    }
}

impl From<document::Repository> for RepositorySummary {
    fn from(r: document::Repository) -> Self {
        RepositorySummary {
            id: r.id,
            name: r.name,
            full_name: r.full_name,
            owner: crate::model::RepositoryOwner {
                id: r.owner.id,
                login: r.owner.login,
                avatar_url: r.owner.avatar_url,
                html_url: r.owner.html_url,
            },
            description: r.description,
            default_branch: r.default_branch,
            html_url: r.html_url,
            stargazers_count: r.stargazers_count,
            forks_count: r.forks_count,
            language: r.language,
            topics: r.topics,
            releases_url: r.releases_url,
            updated_at: r.updated_at,
        }
    }
}

/// Loads category snapshots from `{base_url}/{category}/{platform}.json`.
#[derive(Clone)]
pub struct SnapshotLoader {
    source: Arc<dyn SnapshotSource>,
    base_url: String,
}

impl SnapshotLoader {
    pub fn new(source: Arc<dyn SnapshotSource>, base_url: &str) -> Self {
        Self {
            source,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn snapshot_url(&self, category: DiscoveryCategory, platform: Platform) -> String {
        format!(
            "{}/{}/{}.json",
            self.base_url,
            category.snapshot_name(),
            platform.as_str()
        )
    }

    /// Load a snapshot; `None` on any failure or an empty document.
    #[tracing::instrument(skip(self))]
    pub async fn try_load_cached_snapshot(
        &self,
        category: DiscoveryCategory,
        platform: Platform,
    ) -> Option<PaginatedResult> {
        let url = self.snapshot_url(category, platform);
        match self.load(&url).await {
            Ok(Some(result)) => {
                debug!("Using snapshot {} with {} repos", url, result.repos.len());
                Some(result)
            }
            Ok(None) => {
                debug!("No snapshot at {}, falling back to live API", url);
                None
            }
            Err(e) => {
                debug!("Snapshot {} unusable, falling back to live API: {:#}", url, e);
                None
            }
        }
    }

    async fn load(&self, url: &str) -> Result<Option<PaginatedResult>> {
        let Some(bytes) = self.source.fetch(url).await? else {
            return Ok(None);
        };

        let snapshot: document::Snapshot =
            serde_json::from_slice(&bytes).context("Failed to parse snapshot")?;
        if snapshot.repositories.is_empty() {
            return Ok(None);
        }
        debug!(
            "Snapshot for {} last updated {}",
            snapshot.platform,
            snapshot.last_updated.as_deref().unwrap_or("unknown")
        );

        let total_count = snapshot.total_count;
        let repos: Vec<RepositorySummary> = snapshot
            .repositories
            .into_iter()
            .map(RepositorySummary::from)
            .collect();

        Ok(Some(PaginatedResult {
            total_count: total_count.or(Some(repos.len() as u64)),
            repos,
            has_more: false,
            next_page_index: SNAPSHOT_NEXT_PAGE,
        }))
    }
}
