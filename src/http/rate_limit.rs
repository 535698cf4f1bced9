use reqwest::header::HeaderMap;

/// Rate-limit state reported by the GitHub API in `X-RateLimit-*` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    /// Epoch seconds at which the window resets
    pub reset: i64,
    pub resource: String,
}

impl RateLimitInfo {
    /// Parse rate-limit headers. Returns `None` unless limit, remaining and reset are all present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
            headers.get(name).and_then(|v| v.to_str().ok())
        }

        let limit = header(headers, "x-ratelimit-limit")?.trim().parse().ok()?;
        let remaining = header(headers, "x-ratelimit-remaining")?.trim().parse().ok()?;
        let reset = header(headers, "x-ratelimit-reset")?.trim().parse().ok()?;
        let resource = header(headers, "x-ratelimit-resource")
            .unwrap_or("core")
            .to_string();

        Some(Self {
            limit,
            remaining,
            reset,
            resource,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Seconds until the window resets, relative to `now` (epoch seconds). Never negative.
    pub fn seconds_until_reset(&self, now: i64) -> i64 {
        (self.reset - now).max(0)
    }
}
