//! HTTP client module with retry logic, error classification and rate-limit tracking.

mod client;
mod rate_limit;
mod retry;

pub use client::HttpClient;
pub use rate_limit::RateLimitInfo;
pub use retry::{
    MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, check_response, classify_status,
    is_rate_limited,
};
