use crate::discovery::snapshot::DEFAULT_SNAPSHOT_URL;
use crate::platform::Platform;
use crate::source::DEFAULT_API_URL;

/// Runtime configuration of the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    /// `None` disables snapshot loading
    pub snapshot_url: Option<String>,
    pub platform: Platform,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            snapshot_url: Some(DEFAULT_SNAPSHOT_URL.to_string()),
            platform: Platform::detect(),
        }
    }
}

impl Config {
    /// Build from optional overrides; unset values fall back to defaults.
    pub fn new(
        api_url: Option<String>,
        token: Option<String>,
        snapshot_url: Option<String>,
        no_snapshot: bool,
        platform: Option<Platform>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            api_url: api_url.unwrap_or(defaults.api_url),
            token: token.filter(|t| !t.trim().is_empty()),
            snapshot_url: if no_snapshot {
                None
            } else {
                snapshot_url.or(defaults.snapshot_url)
            },
            platform: platform.unwrap_or(defaults.platform),
        }
    }
}
