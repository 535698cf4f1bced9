//! Query entry points.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::aggregator::{Aggregator, AggregatorTuning, QueryEvent, QueryFailure, QueryOutcome};
use super::cache::ReleaseCheckCache;
use super::developer;
use super::query::{DiscoveryCategory, ProgrammingLanguage, build_search_query};
use super::snapshot::SnapshotLoader;
use super::verifier::Verifier;
use crate::model::{DeveloperProfile, DeveloperRepository, PaginatedResult};
use crate::platform::{Platform, PlatformFilter};
use crate::source::{SearchClient, SearchRequest, SortKey, SortOrder};

/// Buffered events per query before the producer waits for the consumer.
const EVENT_BUFFER: usize = 16;

/// Parameters of a free-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub text: String,
    pub filter: PlatformFilter,
    pub language: Option<ProgrammingLanguage>,
    pub sort: Option<SortKey>,
    pub page: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            text: String::new(),
            filter: PlatformFilter::All,
            language: None,
            sort: None,
            page: 1,
        }
    }
}

/// A running query.
///
/// Dropping the handle cancels the query.
pub struct QueryHandle {
    events: mpsc::Receiver<QueryEvent>,
    task: Option<JoinHandle<QueryOutcome>>,
}

impl QueryHandle {
    /// Next event; `None` once the query has ended.
    pub async fn recv(&mut self) -> Option<QueryEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// Wait for the query to end. A cancelled query reports `Cancelled`.
    pub async fn join(mut self) -> QueryOutcome {
        let Some(task) = self.task.take() else {
            return QueryOutcome::Cancelled;
        };
        task.await.unwrap_or(QueryOutcome::Cancelled)
    }
}

impl Drop for QueryHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Discovery and search over a search client, sharing one release-check cache.
pub struct DiscoveryService {
    client: Arc<dyn SearchClient>,
    aggregator: Aggregator,
    snapshots: Option<SnapshotLoader>,
    platform: Platform,
}

impl DiscoveryService {
    pub fn new(
        client: Arc<dyn SearchClient>,
        cache: Arc<ReleaseCheckCache>,
        snapshots: Option<SnapshotLoader>,
        platform: Platform,
    ) -> Self {
        let verifier = Verifier::new(client.clone(), cache);
        Self {
            aggregator: Aggregator::new(client.clone(), verifier),
            client,
            snapshots,
            platform,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn cache(&self) -> &Arc<ReleaseCheckCache> {
        self.aggregator.verifier().cache()
    }

    /// Run a discovery category query, emitting into `sink`.
    ///
    /// The first page is served from a snapshot when one is available.
    #[tracing::instrument(skip(self, sink))]
    pub async fn discover(
        &self,
        category: DiscoveryCategory,
        page: u32,
        sink: &mpsc::Sender<QueryEvent>,
    ) -> QueryOutcome {
        if page == 1 {
            if let Some(snapshot) = self.try_snapshot(category).await {
                return match sink.send(QueryEvent::Batch(snapshot)).await {
                    Ok(()) => QueryOutcome::Completed,
                    Err(_) => QueryOutcome::Cancelled,
                };
            }
        }

        let tuning = AggregatorTuning::discovery();
        let request = category.search_request(
            self.platform,
            Utc::now().date_naive(),
            page,
            tuning.per_page,
        );
        self.run(&request, self.platform.into(), &tuning, sink)
            .await
    }

    /// Run a free-text search, emitting into `sink`.
    #[tracing::instrument(skip(self, sink))]
    pub async fn search(&self, params: &SearchParams, sink: &mpsc::Sender<QueryEvent>) -> QueryOutcome {
        let tuning = if params.page <= 1 {
            AggregatorTuning::search_first_page()
        } else {
            AggregatorTuning::search_later_page()
        };
        let request = SearchRequest {
            query: build_search_query(&params.text, params.filter, params.language),
            sort: params.sort,
            order: SortOrder::Desc,
            page: params.page.max(1),
            per_page: tuning.per_page,
        };
        self.run(&request, params.filter, &tuning, sink).await
    }

    /// Start a discovery query in the background.
    pub fn spawn_discover(self: &Arc<Self>, category: DiscoveryCategory, page: u32) -> QueryHandle {
        let service = self.clone();
        spawn_query(move |sink| async move { service.discover(category, page, &sink).await })
    }

    /// Start a search in the background.
    pub fn spawn_search(self: &Arc<Self>, params: SearchParams) -> QueryHandle {
        let service = self.clone();
        spawn_query(move |sink| async move { service.search(&params, &sink).await })
    }

    pub async fn developer_profile(&self, username: &str) -> Result<DeveloperProfile> {
        developer::developer_profile(self.client.as_ref(), username).await
    }

    pub async fn developer_repositories(&self, username: &str) -> Result<Vec<DeveloperRepository>> {
        developer::developer_repositories(self.client.as_ref(), username, self.platform.into())
            .await
    }

    async fn try_snapshot(&self, category: DiscoveryCategory) -> Option<PaginatedResult> {
        let loader = self.snapshots.as_ref()?;
        loader
            .try_load_cached_snapshot(category, self.platform)
            .await
    }

    async fn run(
        &self,
        request: &SearchRequest,
        filter: PlatformFilter,
        tuning: &AggregatorTuning,
        sink: &mpsc::Sender<QueryEvent>,
    ) -> QueryOutcome {
        match self.aggregator.run(request, filter, tuning, sink).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Query failed: {:#}", e);
                let failure = QueryFailure::from_error(&e);
                match sink.send(QueryEvent::Failed(failure)).await {
                    Ok(()) => QueryOutcome::Failed,
                    Err(_) => QueryOutcome::Cancelled,
                }
            }
        }
    }
}

fn spawn_query<F, Fut>(query: F) -> QueryHandle
where
    F: FnOnce(mpsc::Sender<QueryEvent>) -> Fut,
    Fut: std::future::Future<Output = QueryOutcome> + Send + 'static,
{
    let (sink, events) = mpsc::channel(EVENT_BUFFER);
    let task = tokio::spawn(query(sink));
    debug!("Spawned query task");
    QueryHandle {
        events,
        task: Some(task),
    }
}
