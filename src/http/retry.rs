//! Retry classification for network operations.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};

use super::RateLimitInfo;

/// Maximum number of retry attempts for network operations.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Errors that should not be retried.
#[derive(Debug)]
pub enum NonRetryableError {
    /// Rate limit exceeded (HTTP 403 with exhausted quota or `Retry-After`, or 429)
    RateLimitExceeded(String),
    /// Authentication failed (HTTP 401)
    AuthenticationFailed(String),
    /// Resource not found (HTTP 404)
    NotFound(String),
    /// Forbidden access (HTTP 403 non-rate-limit)
    Forbidden(String),
    /// Other client errors that won't succeed on retry
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::RateLimitExceeded(msg) => {
                write!(
                    f,
                    "Rate limit exceeded: {}. Try again later or set GITHUB_TOKEN environment variable.",
                    msg
                )
            }
            NonRetryableError::AuthenticationFailed(msg) => {
                write!(f, "Authentication failed: {}. Check your GITHUB_TOKEN.", msg)
            }
            NonRetryableError::NotFound(msg) => {
                write!(f, "Not found: {}", msg)
            }
            NonRetryableError::Forbidden(msg) => {
                write!(f, "Access forbidden: {}. You may need authentication.", msg)
            }
            NonRetryableError::ClientError(msg) => {
                write!(f, "Request error: {}", msg)
            }
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classifies a non-success status as retryable or not.
/// Returns Ok(()) if a retry may succeed, Err with a user-friendly error if not.
pub fn classify_status(status: StatusCode, headers: &HeaderMap) -> Result<(), NonRetryableError> {
    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(
            "Invalid or missing authentication token".to_string(),
        )),
        StatusCode::FORBIDDEN => {
            let exhausted = RateLimitInfo::from_headers(headers)
                .map(|info| info.is_exhausted())
                .unwrap_or(false);
            if exhausted || headers.contains_key(RETRY_AFTER) {
                return Err(NonRetryableError::RateLimitExceeded(
                    "GitHub API rate limit exceeded".to_string(),
                ));
            }
            Err(NonRetryableError::Forbidden(
                "Access to this resource is forbidden".to_string(),
            ))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(
            "Too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(
            "The requested resource was not found".to_string(),
        )),
        // Other 4xx client errors are generally not retryable
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} error",
            s.as_u16()
        ))),
        // 5xx server errors are retryable
        _ => Ok(()),
    }
}

/// Turns a non-success response into an error.
/// Non-retryable statuses become [`NonRetryableError`]; others keep the reqwest error.
pub fn check_response(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    classify_status(status, response.headers())?;

    match response.error_for_status() {
        Err(e) => Err(anyhow::Error::from(e)),
        Ok(_) => Err(anyhow::anyhow!("Unexpected HTTP status {}", status)),
    }
}

/// Whether an error chain carries a rate-limit signal from the remote API.
pub fn is_rate_limited(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<NonRetryableError>(),
            Some(NonRetryableError::RateLimitExceeded(_))
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::RateLimitExceeded("test".to_string());
        assert!(err.to_string().contains("Rate limit"));
        assert!(err.to_string().contains("GITHUB_TOKEN"));

        let err = NonRetryableError::AuthenticationFailed("test".to_string());
        assert!(err.to_string().contains("Authentication"));

        let err = NonRetryableError::NotFound("test".to_string());
        assert!(err.to_string().contains("Not found"));

        let err = NonRetryableError::Forbidden("test".to_string());
        assert!(err.to_string().contains("forbidden"));

        let err = NonRetryableError::ClientError("HTTP 400".to_string());
        assert!(err.to_string().contains("HTTP 400"));
    }

    #[test]
    fn test_classify_status_unauthorized() {
        let result = classify_status(StatusCode::UNAUTHORIZED, &HeaderMap::new());
        assert!(matches!(
            result,
            Err(NonRetryableError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_classify_status_forbidden_without_quota_headers() {
        let result = classify_status(StatusCode::FORBIDDEN, &HeaderMap::new());
        assert!(matches!(result, Err(NonRetryableError::Forbidden(_))));
    }

    #[test]
    fn test_classify_status_forbidden_with_exhausted_quota() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("60"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));

        let result = classify_status(StatusCode::FORBIDDEN, &headers);
        assert!(matches!(
            result,
            Err(NonRetryableError::RateLimitExceeded(_))
        ));
    }

    #[test]
    fn test_classify_status_forbidden_with_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("60"));

        let result = classify_status(StatusCode::FORBIDDEN, &headers);
        assert!(matches!(
            result,
            Err(NonRetryableError::RateLimitExceeded(_))
        ));
    }

    #[test]
    fn test_classify_status_too_many_requests() {
        let result = classify_status(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new());
        assert!(matches!(
            result,
            Err(NonRetryableError::RateLimitExceeded(_))
        ));
    }

    #[test]
    fn test_classify_status_not_found_and_client_error() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, &HeaderMap::new()),
            Err(NonRetryableError::NotFound(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, &HeaderMap::new()),
            Err(NonRetryableError::ClientError(_))
        ));
    }

    #[test]
    fn test_classify_status_server_error_is_retryable() {
        assert!(classify_status(StatusCode::BAD_GATEWAY, &HeaderMap::new()).is_ok());
    }

    #[tokio::test]
    async fn test_check_response_passes_success_through() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        let response = check_response(response).unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_check_response_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(403)
            .with_header("x-ratelimit-limit", "60")
            .with_header("x-ratelimit-remaining", "0")
            .with_header("x-ratelimit-reset", "1700000000")
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        let err = check_response(response).unwrap_err();
        assert!(is_rate_limited(&err));
    }

    #[tokio::test]
    async fn test_check_response_server_error_stays_retryable() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        let err = check_response(response).unwrap_err();
        assert!(err.downcast_ref::<NonRetryableError>().is_none());
        assert!(!is_rate_limited(&err));
    }

    #[test]
    fn test_is_rate_limited_through_context() {
        let err = anyhow::Error::from(NonRetryableError::RateLimitExceeded("x".into()));
        let err = Err::<(), _>(err)
            .context("Searching repositories")
            .unwrap_err();
        assert!(is_rate_limited(&err));

        let other = anyhow::Error::from(NonRetryableError::NotFound("x".into()));
        assert!(!is_rate_limited(&other));
    }
}
