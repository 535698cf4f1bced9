//! Incremental result aggregation over paginated search.
//!
//! A query fetches a page, drops irrelevant candidates, verifies the rest and
//! streams the growing verified list to the consumer. While the target count
//! is not reached it backfills from further pages within a page budget. The
//! last emission carries the authoritative pagination cursor.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use log::{debug, info};
use tokio::sync::mpsc;

use super::scoring::{MAX_CANDIDATES_PER_PAGE, select_candidates};
use super::verifier::Verifier;
use crate::model::{PaginatedResult, RepositorySummary};
use crate::platform::PlatformFilter;
use crate::source::{SearchClient, SearchRequest};

/// Event delivered to the consumer of a query.
///
/// The channel closing after any number of batches is terminal success.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    Batch(PaginatedResult),
    Failed(QueryFailure),
}

/// Terminal failure of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFailure {
    /// The remote API refused the request for quota reasons
    RateLimited(String),
    Request(String),
}

impl QueryFailure {
    pub fn from_error(error: &anyhow::Error) -> Self {
        if crate::http::is_rate_limited(error) {
            QueryFailure::RateLimited(format!("{:#}", error))
        } else {
            QueryFailure::Request(format!("{:#}", error))
        }
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFailure::RateLimited(msg) => write!(f, "Rate limit exceeded: {}", msg),
            QueryFailure::Request(msg) => write!(f, "Request failed: {}", msg),
        }
    }
}

/// How a query run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Completed,
    /// A `QueryEvent::Failed` was the last event
    Failed,
    /// The consumer went away; nothing more was emitted
    Cancelled,
}

/// Pacing and budgets of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorTuning {
    pub per_page: u32,
    /// Stop once this many candidates are verified
    pub target_count: usize,
    /// First partial emission once this many are verified
    pub min_first_emit: Option<usize>,
    /// Later partial emissions every this many newly verified
    pub emit_every: Option<usize>,
    pub concurrency: usize,
    pub per_check_timeout: Duration,
    /// Pages fetched at most, the first one included
    pub max_pages: u32,
    pub candidates_per_page: usize,
}

impl AggregatorTuning {
    /// Curated discovery feeds.
    pub fn discovery() -> Self {
        Self {
            per_page: 100,
            target_count: 10,
            min_first_emit: Some(3),
            emit_every: Some(3),
            concurrency: 25,
            per_check_timeout: Duration::from_secs(5),
            max_pages: 5,
            candidates_per_page: MAX_CANDIDATES_PER_PAGE,
        }
    }

    /// First page of a free-text search.
    pub fn search_first_page() -> Self {
        Self {
            per_page: 30,
            target_count: 24,
            min_first_emit: Some(4),
            emit_every: None,
            concurrency: 12,
            per_check_timeout: Duration::from_millis(1400),
            max_pages: 4,
            candidates_per_page: MAX_CANDIDATES_PER_PAGE,
        }
    }

    /// Pages after the first of a free-text search.
    pub fn search_later_page() -> Self {
        Self {
            per_page: 30,
            target_count: usize::MAX,
            min_first_emit: None,
            emit_every: None,
            concurrency: 10,
            per_check_timeout: Duration::from_secs(2),
            max_pages: 1,
            candidates_per_page: 30,
        }
    }
}

/// Runs queries against a search client, verifying candidates as it goes.
#[derive(Clone)]
pub struct Aggregator {
    client: Arc<dyn SearchClient>,
    verifier: Verifier,
}

struct Progress {
    verified: Vec<RepositorySummary>,
    last_emitted: usize,
    emitted_once: bool,
}

impl Progress {
    /// Whether the latest verified item should trigger a partial emission.
    fn should_emit(&self, tuning: &AggregatorTuning) -> bool {
        let count = self.verified.len();
        if !self.emitted_once {
            tuning.min_first_emit.is_some_and(|min| count >= min)
        } else {
            tuning
                .emit_every
                .is_some_and(|every| count - self.last_emitted >= every)
        }
    }
}

impl Aggregator {
    pub fn new(client: Arc<dyn SearchClient>, verifier: Verifier) -> Self {
        Self { client, verifier }
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    /// Run one query starting at `request.page`, emitting into `sink`.
    ///
    /// Page fetch failures, rate limiting included, end the run with an error
    /// and nothing further is emitted. A rate-limited release check ends it the
    /// same way and drops the checks still pending. A closed sink ends it as
    /// cancelled.
    /// Never returns `QueryOutcome::Failed`; reporting errors is up to the
    /// caller.
    #[tracing::instrument(skip(self, tuning, sink), fields(query = %request.query, page = request.page))]
    pub async fn run(
        &self,
        request: &SearchRequest,
        filter: PlatformFilter,
        tuning: &AggregatorTuning,
        sink: &mpsc::Sender<QueryEvent>,
    ) -> Result<QueryOutcome> {
        let mut progress = Progress {
            verified: Vec::new(),
            last_emitted: 0,
            emitted_once: false,
        };
        let mut page = request.page;
        let mut pages_fetched = 0;
        let mut total_count;

        let (has_more, next_page_index) = loop {
            if sink.is_closed() {
                debug!("Consumer gone before page {}", page);
                return Ok(QueryOutcome::Cancelled);
            }

            let response = self
                .client
                .search_repositories(&SearchRequest {
                    per_page: tuning.per_page,
                    ..request.at_page(page)
                })
                .await
                .with_context(|| format!("Failed to fetch search page {}", page))?;
            pages_fetched += 1;
            total_count = response.total_count;

            debug!(
                "Page {}: {} items of {} total",
                page,
                response.items.len(),
                total_count
            );

            if response.items.is_empty() {
                break (false, page);
            }

            let candidates =
                select_candidates(&response.items, filter, tuning.candidates_per_page);
            debug!("Checking {} candidates for installers", candidates.len());

            let mut outcomes = self.verifier.verify_stream(
                &candidates,
                filter,
                tuning.concurrency,
                tuning.per_check_timeout,
            );

            while let Some(outcome) = outcomes.next().await {
                let Some(verified) = outcome
                    .with_context(|| format!("Release checks of page {} were refused", page))?
                else {
                    continue;
                };
                progress.verified.push(verified.into_inner());

                if progress.should_emit(tuning) {
                    let batch = PaginatedResult {
                        repos: progress.verified.clone(),
                        has_more: true,
                        next_page_index: page.saturating_add(1),
                        total_count: Some(total_count),
                    };
                    if sink.send(QueryEvent::Batch(batch)).await.is_err() {
                        debug!("Consumer gone during verification of page {}", page);
                        return Ok(QueryOutcome::Cancelled);
                    }
                    progress.emitted_once = true;
                    progress.last_emitted = progress.verified.len();
                }

                if progress.verified.len() >= tuning.target_count {
                    break;
                }
            }

            let remote_has_more = u64::from(page) * u64::from(tuning.per_page) < total_count;
            if progress.verified.len() >= tuning.target_count
                || !remote_has_more
                || pages_fetched >= tuning.max_pages
            {
                break (remote_has_more, page.saturating_add(1));
            }
            page = page.saturating_add(1);
        };

        info!(
            "Query finished with {} verified repositories after {} page(s)",
            progress.verified.len(),
            pages_fetched
        );

        let last = PaginatedResult {
            repos: progress.verified,
            has_more,
            next_page_index,
            total_count: Some(total_count),
        };
        if sink.send(QueryEvent::Batch(last)).await.is_err() {
            return Ok(QueryOutcome::Cancelled);
        }

        Ok(QueryOutcome::Completed)
    }
}
