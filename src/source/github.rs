//! GitHub search client implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use crate::http::HttpClient;
use crate::model::{DeveloperProfile, OwnedRepository, Release, ReleaseAsset};

use super::{RepoId, SearchClient, SearchPage, SearchRequest};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    use crate::model::RepositorySummary;

    #[derive(Deserialize, Debug)]
    pub struct SearchResponse {
        pub total_count: u64,
        #[serde(default)]
        pub items: Vec<RepositorySummary>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub tag_name: String,
        pub name: Option<String>,
        #[serde(default)]
        pub draft: Option<bool>,
        #[serde(default)]
        pub prerelease: Option<bool>,
        pub published_at: Option<String>,
        pub created_at: Option<String>,
        #[serde(default)]
        pub assets: Vec<Asset>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub name: String,
        #[serde(default)]
        pub size: u64,
        pub content_type: Option<String>,
        #[serde(default)]
        pub browser_download_url: String,
    }
}

/// GitHub search client.
pub struct GitHubSource {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubSource {
    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }
}

#[async_trait]
impl SearchClient for GitHubSource {
    #[tracing::instrument(skip(self))]
    async fn search_repositories(&self, request: &SearchRequest) -> Result<SearchPage> {
        let url = format!("{}/search/repositories", self.api_url);
        let page = request.page.to_string();
        let per_page = request.per_page.to_string();

        let mut query = vec![("q", request.query.as_str())];
        if let Some(sort) = request.sort {
            query.push(("sort", sort.as_str()));
            query.push(("order", request.order.as_str()));
        }
        query.push(("per_page", per_page.as_str()));
        query.push(("page", page.as_str()));

        debug!("Searching repositories page {}: {}", request.page, request.query);

        let response: api::SearchResponse = self
            .http_client
            .get_json_with_query(&url, &query)
            .await
            .context("Failed to search repositories")?;

        Ok(SearchPage {
            total_count: response.total_count,
            items: response.items,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_releases(&self, repo: &RepoId, per_page: u32) -> Result<Vec<Release>> {
        let url = format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.repo);
        debug!("Fetching releases from {}...", url);

        let per_page = per_page.to_string();
        let releases: Vec<api::Release> = self
            .http_client
            .get_json_with_query(&url, &[("per_page", per_page.as_str())])
            .await
            .with_context(|| format!("Failed to fetch releases of {}", repo))?;

        Ok(releases.into_iter().map(Release::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_user_repositories(
        &self,
        username: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<OwnedRepository>> {
        let url = format!("{}/users/{}/repos", self.api_url, username);
        debug!("Fetching repositories page {} from {}...", page, url);

        let per_page = per_page.to_string();
        let page = page.to_string();
        self.http_client
            .get_json_with_query(
                &url,
                &[
                    ("per_page", per_page.as_str()),
                    ("page", page.as_str()),
                    ("type", "owner"),
                    ("sort", "updated"),
                    ("direction", "desc"),
                ],
            )
            .await
            .with_context(|| format!("Failed to fetch repositories of {}", username))
    }

    #[tracing::instrument(skip(self))]
    async fn get_user(&self, username: &str) -> Result<DeveloperProfile> {
        let url = format!("{}/users/{}", self.api_url, username);
        self.http_client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch profile of {}", username))
    }
}

impl From<api::Release> for Release {
    fn from(r: api::Release) -> Self {
        Release {
            tag: r.tag_name,
            name: r.name,
            draft: r.draft.unwrap_or(false),
            prerelease: r.prerelease.unwrap_or(false),
            published_at: r.published_at,
            created_at: r.created_at,
            assets: r.assets.into_iter().map(ReleaseAsset::from).collect(),
        }
    }
}

impl From<api::Asset> for ReleaseAsset {
    fn from(a: api::Asset) -> Self {
        ReleaseAsset {
            name: a.name,
            size: a.size,
            content_type: a.content_type,
            download_url: a.browser_download_url,
        }
    }
}
