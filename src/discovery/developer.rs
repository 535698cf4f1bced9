//! Repositories of a single developer, annotated with release status.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::future::join_all;
use log::{debug, warn};
use tokio::sync::Semaphore;

use super::installability::{is_installable, latest_stable_release};
use super::verifier::RELEASES_PER_CHECK;
use crate::model::{DeveloperProfile, DeveloperRepository, OwnedRepository};
use crate::platform::PlatformFilter;
use crate::source::{RepoId, SearchClient};

/// Release checks in flight at once.
pub const DEVELOPER_CHECK_CONCURRENCY: usize = 20;

/// Repositories per listing page.
pub const REPOS_PER_PAGE: u32 = 100;

#[tracing::instrument(skip(client))]
pub async fn developer_profile(client: &dyn SearchClient, username: &str) -> Result<DeveloperProfile> {
    client.get_user(username).await
}

/// List a developer's own active repositories with their release status.
///
/// Archived repositories and forks are skipped. A failed release check marks
/// that repository as having no releases without failing the listing.
#[tracing::instrument(skip(client))]
pub async fn developer_repositories(
    client: &dyn SearchClient,
    username: &str,
    filter: PlatformFilter,
) -> Result<Vec<DeveloperRepository>> {
    let mut owned = Vec::new();
    let mut page = 1;

    loop {
        let repos = client
            .list_user_repositories(username, page, REPOS_PER_PAGE)
            .await
            .with_context(|| format!("Failed to list repositories of {}", username))?;
        let fetched = repos.len();
        debug!("Page {} of {}: {} repositories", page, username, fetched);

        owned.extend(repos.into_iter().filter(|r| !r.archived && !r.fork));

        if fetched < REPOS_PER_PAGE as usize {
            break;
        }
        page += 1;
    }

    let semaphore = Arc::new(Semaphore::new(DEVELOPER_CHECK_CONCURRENCY));
    let checks = owned.into_iter().map(|repo| {
        let semaphore = semaphore.clone();
        async move {
            let _permit = semaphore.acquire().await.ok();
            release_status(client, username, repo, filter).await
        }
    });

    Ok(join_all(checks).await)
}

async fn release_status(
    client: &dyn SearchClient,
    username: &str,
    repo: OwnedRepository,
    filter: PlatformFilter,
) -> DeveloperRepository {
    let repo_id = RepoId {
        owner: repo
            .full_name
            .split('/')
            .next()
            .unwrap_or(username)
            .to_string(),
        repo: repo.name.clone(),
    };

    let releases = match client.list_releases(&repo_id, RELEASES_PER_CHECK).await {
        Ok(releases) => releases,
        Err(e) => {
            warn!("Failed to check releases for {}: {:#}", repo_id, e);
            return DeveloperRepository {
                repo,
                has_releases: false,
                has_installable_assets: false,
                latest_version: None,
            };
        }
    };

    let (has_installable_assets, latest_version) = match latest_stable_release(&releases) {
        Some(release) if is_installable(release, filter) => (true, Some(release.tag.clone())),
        _ => (false, None),
    };

    DeveloperRepository {
        repo,
        has_releases: !releases.is_empty(),
        has_installable_assets,
        latest_version,
    }
}
