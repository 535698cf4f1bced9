//! Service factory for building application dependencies.
//!
//! Services are built from configuration values but are not part of the
//! configuration itself.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    discovery::{DiscoveryService, HttpSnapshotSource, ReleaseCheckCache, SnapshotLoader},
    http::HttpClient,
    source::GitHubSource,
};

use super::config::Config;

const USER_AGENT: &str = "ghstore-cli";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Per-request deadline of GitHub API calls.
const API_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request deadline of snapshot downloads.
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build an HTTP client for the GitHub API with optional authentication token
pub fn build_http_client(token: Option<&str>) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

    if let Some(token) = token {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("HTTP client configured with authentication");
    }

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(API_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;

    Ok(HttpClient::new(client))
}

/// Build an unauthenticated HTTP client for snapshot documents
pub fn build_snapshot_client() -> Result<HttpClient> {
    snapshot_client(SNAPSHOT_TIMEOUT)
}

fn snapshot_client(timeout: Duration) -> Result<HttpClient> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()?;
    Ok(HttpClient::new(client))
}

/// Build a snapshot loader, or `None` when snapshots are disabled
pub fn build_snapshot_loader(config: &Config) -> Result<Option<SnapshotLoader>> {
    let Some(base_url) = config.snapshot_url.as_deref() else {
        return Ok(None);
    };
    let source = HttpSnapshotSource::new(build_snapshot_client()?);
    Ok(Some(SnapshotLoader::new(Arc::new(source), base_url)))
}

/// Container for the services a command needs.
pub struct Services {
    pub discovery: Arc<DiscoveryService>,
    /// Shared with the search client; exposes the latest rate-limit state
    pub http_client: HttpClient,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = build_http_client(config.token.as_deref())?;
        let source = GitHubSource::from_http_client(http_client.clone(), &config.api_url);
        let discovery = DiscoveryService::new(
            Arc::new(source),
            Arc::new(ReleaseCheckCache::new()),
            build_snapshot_loader(config)?,
            config.platform,
        );

        Ok(Self {
            discovery: Arc::new(discovery),
            http_client,
        })
    }

    /// Warn when the last response reported an exhausted quota.
    pub fn report_rate_limit(&self) {
        let Some(info) = self.http_client.rate_limit() else {
            return;
        };
        debug!(
            "Rate limit ({}): {}/{} remaining",
            info.resource, info.remaining, info.limit
        );
        if info.is_exhausted() {
            let wait = info.seconds_until_reset(chrono::Utc::now().timestamp());
            warn!(
                "GitHub {} rate limit exhausted, resets in {}s. Set GITHUB_TOKEN to raise it.",
                info.resource, wait
            );
        }
    }
}
