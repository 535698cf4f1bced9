//! Bounded-concurrency release checks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::stream::{FuturesOrdered, Stream, StreamExt};
use log::{debug, warn};
use tokio::sync::Semaphore;

use super::cache::{ReleaseCheckCache, cache_key};
use super::installability::installable_release;
use crate::http::is_rate_limited;
use crate::model::{RepositorySummary, VerifiedCandidate};
use crate::platform::PlatformFilter;
use crate::source::SearchClient;

/// Releases fetched per check.
pub const RELEASES_PER_CHECK: u32 = 10;

/// Checks whether candidates ship an installer in their latest stable release.
///
/// Checks are driven by the returned futures and never spawned, so dropping
/// them cancels every in-flight request.
#[derive(Clone)]
pub struct Verifier {
    client: Arc<dyn SearchClient>,
    cache: Arc<ReleaseCheckCache>,
}

impl Verifier {
    pub fn new(client: Arc<dyn SearchClient>, cache: Arc<ReleaseCheckCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &Arc<ReleaseCheckCache> {
        &self.cache
    }

    /// Check one candidate, consulting the cache first.
    ///
    /// Definitive outcomes, negative ones included, are cached. Errors are not.
    pub async fn check(
        &self,
        repo: &RepositorySummary,
        filter: PlatformFilter,
    ) -> Result<Option<VerifiedCandidate>> {
        let repo_id = repo.repo_id();
        let key = cache_key(&repo_id, filter);

        if let Some(cached) = self.cache.get(&key) {
            debug!("Release check cache hit for {}", key);
            return Ok(cached);
        }

        let releases = self
            .client
            .list_releases(&repo_id, RELEASES_PER_CHECK)
            .await?;

        let outcome = installable_release(&releases, filter)
            .map(|_| VerifiedCandidate::new(repo.clone()));
        self.cache.put(key, outcome.clone());

        Ok(outcome)
    }

    /// Check candidates concurrently, yielding outcomes in input order.
    ///
    /// At most `concurrency` checks hold a permit at once. A check that fails
    /// or exceeds `per_check_timeout` yields `Ok(None)` for that candidate
    /// only. A rate-limited check yields the error, so the caller can stop
    /// issuing requests against an exhausted quota.
    pub fn verify_stream<'a>(
        &'a self,
        candidates: &'a [RepositorySummary],
        filter: PlatformFilter,
        concurrency: usize,
        per_check_timeout: Duration,
    ) -> impl Stream<Item = Result<Option<VerifiedCandidate>>> + Send + Unpin + 'a {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

        candidates
            .iter()
            .map(move |repo| {
                let semaphore = semaphore.clone();
                async move {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return Ok(None);
                    };
                    match tokio::time::timeout(per_check_timeout, self.check(repo, filter)).await {
                        Ok(Ok(outcome)) => Ok(outcome),
                        Ok(Err(e)) if is_rate_limited(&e) => {
                            warn!("Rate limited while checking {}: {}", repo.full_name, e);
                            Err(e.context(format!("Failed to check releases of {}", repo.full_name)))
                        }
                        Ok(Err(e)) => {
                            debug!("Release check failed for {}: {:#}", repo.full_name, e);
                            Ok(None)
                        }
                        Err(_) => {
                            debug!(
                                "Release check for {} timed out after {:?}",
                                repo.full_name, per_check_timeout
                            );
                            Ok(None)
                        }
                    }
                }
            })
            .collect::<FuturesOrdered<_>>()
    }

    /// Check all candidates; element `i` is the outcome of `candidates[i]`.
    ///
    /// Rate-limited checks count as not installable here.
    #[tracing::instrument(skip(self, candidates), fields(count = candidates.len()))]
    pub async fn verify_batch(
        &self,
        candidates: &[RepositorySummary],
        filter: PlatformFilter,
        concurrency: usize,
        per_check_timeout: Duration,
    ) -> Vec<Option<VerifiedCandidate>> {
        self.verify_stream(candidates, filter, concurrency, per_check_timeout)
            .map(|outcome| outcome.ok().flatten())
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::NonRetryableError;
    use crate::model::{Release, ReleaseAsset, RepositoryOwner};
    use crate::platform::Platform;
    use crate::source::MockSearchClient;
    use crate::test_utils::{FakeSearchClient, installable_release_with, repo_summary};
    use std::sync::atomic::Ordering;

    fn verifier(client: impl SearchClient + 'static) -> Verifier {
        Verifier::new(Arc::new(client), Arc::new(ReleaseCheckCache::new()))
    }

    fn stable_release(asset: &str) -> Release {
        Release {
            tag: "v1.0.0".into(),
            published_at: Some("2024-01-01T00:00:00Z".into()),
            assets: vec![ReleaseAsset {
                name: asset.into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn repo(owner: &str, name: &str) -> RepositorySummary {
        RepositorySummary {
            id: 1,
            name: name.into(),
            full_name: format!("{}/{}", owner, name),
            owner: RepositoryOwner {
                login: owner.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_check_caches_positive_and_negative() {
        let mut client = MockSearchClient::new();
        client
            .expect_list_releases()
            .withf(|repo, per_page| repo.repo == "app" && *per_page == RELEASES_PER_CHECK)
            .times(1)
            .returning(|_, _| Ok(vec![stable_release("app.apk")]));
        client
            .expect_list_releases()
            .withf(|repo, _| repo.repo == "lib")
            .times(1)
            .returning(|_, _| Ok(vec![stable_release("lib.jar")]));

        let verifier = verifier(client);
        let filter = Platform::Android.into();

        for _ in 0..2 {
            let app = verifier.check(&repo("octo", "app"), filter).await.unwrap();
            assert!(app.is_some());
            let lib = verifier.check(&repo("octo", "lib"), filter).await.unwrap();
            assert!(lib.is_none());
        }
        assert!(verifier.cache().contains("octo/lib:LATEST_PLATFORM_android"));
    }

    #[tokio::test]
    async fn test_check_errors_are_not_cached() {
        let mut client = MockSearchClient::new();
        client
            .expect_list_releases()
            .times(2)
            .returning(|_, _| Err(anyhow::anyhow!("connection reset")));

        let verifier = verifier(client);
        let candidate = repo("octo", "app");
        assert!(verifier.check(&candidate, PlatformFilter::All).await.is_err());
        assert!(verifier.check(&candidate, PlatformFilter::All).await.is_err());
        assert!(verifier.cache().is_empty());
    }

    #[tokio::test]
    async fn test_verify_batch_preserves_input_order() {
        let fake = FakeSearchClient::new();
        let candidates: Vec<RepositorySummary> = (0..12)
            .map(|i| {
                let r = repo_summary(i, "octo", &format!("r{}", i));
                if i % 3 != 0 {
                    fake.set_releases(&r, vec![installable_release_with("x.AppImage")]);
                }
                // earlier candidates answer later
                fake.set_delay(&r, Duration::from_millis(5 * (12 - i)));
                r
            })
            .collect();

        let verifier = verifier(fake);
        let results = verifier
            .verify_batch(&candidates, Platform::Linux.into(), 4, Duration::from_secs(5))
            .await;

        assert_eq!(results.len(), candidates.len());
        for (i, result) in results.iter().enumerate() {
            if i % 3 == 0 {
                assert!(result.is_none(), "candidate {} should fail", i);
            } else {
                assert_eq!(result.as_ref().unwrap().repo().id, candidates[i].id);
            }
        }
    }

    #[tokio::test]
    async fn test_verify_batch_respects_concurrency() {
        let fake = FakeSearchClient::new();
        let candidates: Vec<RepositorySummary> = (0..20)
            .map(|i| {
                let r = repo_summary(i, "octo", &format!("r{}", i));
                fake.set_delay(&r, Duration::from_millis(10));
                r
            })
            .collect();
        let stats = fake.stats();

        let verifier = verifier(fake);
        verifier
            .verify_batch(&candidates, PlatformFilter::All, 3, Duration::from_secs(5))
            .await;

        assert_eq!(stats.release_calls.load(Ordering::SeqCst), 20);
        assert!(stats.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_timeout_isolated_to_one_candidate() {
        let fake = FakeSearchClient::new();
        let candidates: Vec<RepositorySummary> = (0..4)
            .map(|i| {
                let r = repo_summary(i, "octo", &format!("r{}", i));
                fake.set_releases(&r, vec![installable_release_with("x.dmg")]);
                r
            })
            .collect();
        fake.set_delay(&candidates[1], Duration::from_secs(5));

        let verifier = verifier(fake);
        let results = verifier
            .verify_batch(
                &candidates,
                Platform::Macos.into(),
                4,
                Duration::from_millis(50),
            )
            .await;

        assert!(results[0].is_some());
        assert!(results[1].is_none());
        assert!(results[2].is_some());
        assert!(results[3].is_some());
        // a timed out check leaves no cache entry behind
        assert!(!verifier.cache().contains("octo/r1:LATEST_PLATFORM_macos"));
    }

    #[tokio::test]
    async fn test_rate_limited_candidate_yields_none() {
        let mut client = MockSearchClient::new();
        client.expect_list_releases().returning(|repo, _| {
            if repo.repo == "limited" {
                Err(NonRetryableError::RateLimitExceeded("quota".into()).into())
            } else {
                Ok(vec![stable_release("a.exe")])
            }
        });

        let verifier = verifier(client);
        let candidates = vec![repo("octo", "limited"), repo("octo", "fine")];
        let results = verifier
            .verify_batch(&candidates, Platform::Windows.into(), 2, Duration::from_secs(1))
            .await;

        assert!(results[0].is_none());
        assert!(results[1].is_some());
    }

    #[tokio::test]
    async fn test_verify_stream_surfaces_rate_limit() {
        let mut client = MockSearchClient::new();
        client.expect_list_releases().returning(|repo, _| {
            if repo.repo == "limited" {
                Err(NonRetryableError::RateLimitExceeded("quota".into()).into())
            } else if repo.repo == "broken" {
                Err(anyhow::anyhow!("connection reset"))
            } else {
                Ok(vec![stable_release("a.exe")])
            }
        });

        let verifier = verifier(client);
        let candidates = vec![
            repo("octo", "fine"),
            repo("octo", "broken"),
            repo("octo", "limited"),
        ];
        let outcomes: Vec<_> = verifier
            .verify_stream(&candidates, Platform::Windows.into(), 1, Duration::from_secs(1))
            .collect()
            .await;

        assert!(outcomes[0].as_ref().unwrap().is_some());
        assert!(outcomes[1].as_ref().unwrap().is_none());
        let err = outcomes[2].as_ref().unwrap_err();
        assert!(is_rate_limited(err));
        assert!(!verifier.cache().contains("octo/limited:LATEST_PLATFORM_windows"));
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels_pending_checks() {
        let fake = FakeSearchClient::new();
        let candidates: Vec<RepositorySummary> = (0..5)
            .map(|i| {
                let r = repo_summary(i, "octo", &format!("r{}", i));
                fake.set_releases(&r, vec![installable_release_with("x.apk")]);
                fake.set_delay(&r, Duration::from_millis(if i == 0 { 0 } else { 200 }));
                r
            })
            .collect();
        let stats = fake.stats();

        let verifier = verifier(fake);
        {
            let mut stream = Box::pin(verifier.verify_stream(
                &candidates,
                Platform::Android.into(),
                5,
                Duration::from_secs(5),
            ));
            let first = stream.next().await.unwrap().unwrap();
            assert!(first.is_some());
        }
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(stats.completed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(verifier.cache().len(), 1);
    }
}
