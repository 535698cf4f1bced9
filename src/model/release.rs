use serde::{Deserialize, Serialize};

/// A downloadable asset from a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub download_url: String,
}

/// A release of a repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Release {
    /// Version tag (e.g., "v1.0.0")
    pub tag: String,
    /// Release name/title
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    /// Publication date (ISO 8601)
    #[serde(default)]
    pub published_at: Option<String>,
    /// Creation date (ISO 8601); drafts have no publication date
    #[serde(default)]
    pub created_at: Option<String>,
    /// Downloadable assets, in API order
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// Neither a draft nor a pre-release.
    pub fn is_stable(&self) -> bool {
        !self.draft && !self.prerelease
    }

    /// Timestamp used to order releases: publication date, else creation date.
    pub fn timestamp(&self) -> Option<&str> {
        self.published_at
            .as_deref()
            .or(self.created_at.as_deref())
    }
}
