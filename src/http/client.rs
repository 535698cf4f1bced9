//! HTTP client with built-in retry logic and error handling.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::rate_limit::RateLimitInfo;
use super::retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, check_response};

/// HTTP client with built-in retry logic for network operations.
///
/// Every response's `X-RateLimit-*` headers are recorded so callers can report
/// the remaining quota.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry_delay: Duration,
    rate_limit: Arc<Mutex<Option<RateLimitInfo>>>,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            rate_limit: Arc::new(Mutex::new(None)),
        }
    }

    /// Overrides the delay between retry attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// The most recent rate-limit state seen in a response, if any.
    pub fn rate_limit(&self) -> Option<RateLimitInfo> {
        self.rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Performs a GET request and deserializes the JSON response.
    /// Automatically retries on transient errors.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_query(url, &[]).await
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    /// Automatically retries on transient errors.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        self.with_retry("GET JSON", || async {
            let response = self.send(url, query).await?;
            let response = check_response(response)?;

            let result = response
                .json::<T>()
                .await
                .context("Failed to parse JSON response")?;

            Ok(result)
        })
        .await
    }

    /// Performs a GET request and returns the body, or `None` on HTTP 404.
    /// Automatically retries on transient errors.
    #[tracing::instrument(skip(self))]
    pub async fn get_optional_bytes(&self, url: &str) -> Result<Option<Vec<u8>>> {
        debug!("GET bytes from {}...", url);

        self.with_retry("GET bytes", || async {
            let response = self.send(url, &[]).await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            let response = check_response(response)?;
            let body = response
                .bytes()
                .await
                .context("Failed to read response body")?;

            Ok(Some(body.to_vec()))
        })
        .await
    }

    async fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.context("Failed to send request")?;

        if let Some(info) = RateLimitInfo::from_headers(response.headers()) {
            debug!(
                "Rate limit ({}): {}/{} remaining",
                info.resource, info.remaining, info.limit
            );
            *self.rate_limit.lock().unwrap_or_else(PoisonError::into_inner) = Some(info);
        }

        Ok(response)
    }

    /// Executes an async operation with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable_error(&e) {
                        debug!("{}: non-retryable error: {}", operation_name, e);
                        return Err(e);
                    }

                    if attempt < MAX_RETRIES {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {:?}...",
                            operation_name, attempt, MAX_RETRIES, e, self.retry_delay
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            anyhow::anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)
        }))
    }
}

/// Checks if an anyhow::Error is retryable based on its content.
fn is_retryable_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}
