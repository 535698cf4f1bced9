//! Search query construction for curated categories and free-text search.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};

use crate::platform::{Platform, PlatformFilter};
use crate::source::{SearchRequest, SortKey, SortOrder};

const SEARCH_SCOPE: &str = " in:name,description,readme";
const SEARCH_COMMON: &str = " archived:false fork:false";
const BLANK_QUERY: &str = "stars:>100";

/// Curated discovery feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryCategory {
    Trending,
    HotRelease,
    MostPopular,
}

impl DiscoveryCategory {
    pub const ALL: [DiscoveryCategory; 3] = [
        DiscoveryCategory::Trending,
        DiscoveryCategory::HotRelease,
        DiscoveryCategory::MostPopular,
    ];

    /// Directory of this category in the snapshot store
    pub fn snapshot_name(&self) -> &'static str {
        match self {
            DiscoveryCategory::Trending => "trending",
            DiscoveryCategory::HotRelease => "new-releases",
            DiscoveryCategory::MostPopular => "most-popular",
        }
    }

    /// Search qualifiers relative to `today`, without the platform topic.
    pub fn base_query(&self, today: NaiveDate) -> String {
        match self {
            DiscoveryCategory::Trending => format!(
                "stars:>50 archived:false pushed:>={}",
                days_before(today, 30)
            ),
            DiscoveryCategory::HotRelease => format!(
                "stars:>10 archived:false pushed:>={}",
                days_before(today, 14)
            ),
            DiscoveryCategory::MostPopular => format!(
                "stars:>1000 archived:false created:<{} pushed:>={}",
                days_before(today, 180),
                days_before(today, 365)
            ),
        }
    }

    pub fn sort(&self) -> SortKey {
        match self {
            DiscoveryCategory::HotRelease => SortKey::Updated,
            DiscoveryCategory::Trending | DiscoveryCategory::MostPopular => SortKey::Stars,
        }
    }

    /// Full search request for `platform` at `page`.
    pub fn search_request(
        &self,
        platform: Platform,
        today: NaiveDate,
        page: u32,
        per_page: u32,
    ) -> SearchRequest {
        SearchRequest {
            query: format!(
                "{} topic:{}",
                self.base_query(today),
                platform.discovery_topic()
            ),
            sort: Some(self.sort()),
            order: SortOrder::Desc,
            page,
            per_page,
        }
    }
}

impl fmt::Display for DiscoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiscoveryCategory::Trending => "trending",
            DiscoveryCategory::HotRelease => "hot-release",
            DiscoveryCategory::MostPopular => "most-popular",
        })
    }
}

impl FromStr for DiscoveryCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trending" => Ok(DiscoveryCategory::Trending),
            "hot-release" | "new-releases" => Ok(DiscoveryCategory::HotRelease),
            "most-popular" | "popular" => Ok(DiscoveryCategory::MostPopular),
            _ => anyhow::bail!(
                "Unknown category: {}. Expected trending, hot-release, or most-popular.",
                s
            ),
        }
    }
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Language filter of a free-text search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgrammingLanguage {
    Kotlin,
    Java,
    JavaScript,
    TypeScript,
    Python,
    Swift,
    Rust,
    Go,
    CSharp,
    CPlusPlus,
    C,
    Dart,
    Ruby,
    Php,
}

impl ProgrammingLanguage {
    pub const ALL: [ProgrammingLanguage; 14] = [
        ProgrammingLanguage::Kotlin,
        ProgrammingLanguage::Java,
        ProgrammingLanguage::JavaScript,
        ProgrammingLanguage::TypeScript,
        ProgrammingLanguage::Python,
        ProgrammingLanguage::Swift,
        ProgrammingLanguage::Rust,
        ProgrammingLanguage::Go,
        ProgrammingLanguage::CSharp,
        ProgrammingLanguage::CPlusPlus,
        ProgrammingLanguage::C,
        ProgrammingLanguage::Dart,
        ProgrammingLanguage::Ruby,
        ProgrammingLanguage::Php,
    ];

    /// Value of the `language:` qualifier
    pub fn query_value(&self) -> &'static str {
        match self {
            ProgrammingLanguage::Kotlin => "kotlin",
            ProgrammingLanguage::Java => "java",
            ProgrammingLanguage::JavaScript => "javascript",
            ProgrammingLanguage::TypeScript => "typescript",
            ProgrammingLanguage::Python => "python",
            ProgrammingLanguage::Swift => "swift",
            ProgrammingLanguage::Rust => "rust",
            ProgrammingLanguage::Go => "go",
            ProgrammingLanguage::CSharp => "c#",
            ProgrammingLanguage::CPlusPlus => "c++",
            ProgrammingLanguage::C => "c",
            ProgrammingLanguage::Dart => "dart",
            ProgrammingLanguage::Ruby => "ruby",
            ProgrammingLanguage::Php => "php",
        }
    }
}

impl FromStr for ProgrammingLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let lower = match lower.as_str() {
            "csharp" => "c#",
            "cpp" => "c++",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|lang| lang.query_value() == lower)
            .ok_or_else(|| anyhow::anyhow!("Unknown language: {}", s))
    }
}

/// Build the `q` parameter of a free-text search.
pub fn build_search_query(
    text: &str,
    filter: PlatformFilter,
    language: Option<ProgrammingLanguage>,
) -> String {
    let clean = text.trim();
    let q = if clean.is_empty() {
        BLANK_QUERY.to_string()
    } else if clean.chars().any(char::is_whitespace) {
        format!("\"{}\"", clean)
    } else {
        clean.to_string()
    };

    let platform_hint = match filter {
        PlatformFilter::All => "",
        PlatformFilter::Only(Platform::Android) => {
            " (topic:android OR apk in:name,description,readme)"
        }
        PlatformFilter::Only(Platform::Windows) => {
            " (topic:windows OR exe in:name,description,readme OR msi in:name,description,readme)"
        }
        PlatformFilter::Only(Platform::Macos) => {
            " (topic:macos OR dmg in:name,description,readme OR pkg in:name,description,readme)"
        }
        PlatformFilter::Only(Platform::Linux) => {
            " (topic:linux OR appimage in:name,description,readme OR deb in:name,description,readme)"
        }
    };

    let language_filter = language
        .map(|lang| format!(" language:{}", lang.query_value()))
        .unwrap_or_default();

    format!("{q}{SEARCH_SCOPE}{SEARCH_COMMON}{platform_hint}{language_filter}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_category_queries() {
        let today = date("2024-06-30");
        assert_eq!(
            DiscoveryCategory::Trending.base_query(today),
            "stars:>50 archived:false pushed:>=2024-05-31"
        );
        assert_eq!(
            DiscoveryCategory::HotRelease.base_query(today),
            "stars:>10 archived:false pushed:>=2024-06-16"
        );
        assert_eq!(
            DiscoveryCategory::MostPopular.base_query(today),
            "stars:>1000 archived:false created:<2024-01-02 pushed:>=2023-07-01"
        );
    }

    #[test]
    fn test_category_request_adds_topic_and_sort() {
        let request = DiscoveryCategory::HotRelease.search_request(
            Platform::Windows,
            date("2024-06-30"),
            3,
            100,
        );
        assert!(request.query.ends_with(" topic:desktop"));
        assert_eq!(request.sort, Some(SortKey::Updated));
        assert_eq!(request.order, SortOrder::Desc);
        assert_eq!(request.page, 3);
        assert_eq!(request.per_page, 100);
    }

    #[test]
    fn test_category_parse_and_snapshot_name() {
        for category in DiscoveryCategory::ALL {
            let parsed: DiscoveryCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!(DiscoveryCategory::HotRelease.snapshot_name(), "new-releases");
        assert!("weekly".parse::<DiscoveryCategory>().is_err());
    }

    #[test]
    fn test_blank_query() {
        assert_eq!(
            build_search_query("   ", PlatformFilter::All, None),
            "stars:>100 in:name,description,readme archived:false fork:false"
        );
    }

    #[test]
    fn test_multi_word_query_is_quoted() {
        let q = build_search_query(" note taking ", PlatformFilter::All, None);
        assert!(q.starts_with("\"note taking\" in:name"));
    }

    #[test]
    fn test_platform_hint_and_language() {
        let q = build_search_query(
            "player",
            Platform::Android.into(),
            Some(ProgrammingLanguage::Kotlin),
        );
        assert_eq!(
            q,
            "player in:name,description,readme archived:false fork:false \
             (topic:android OR apk in:name,description,readme) language:kotlin"
        );
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(
            "C#".parse::<ProgrammingLanguage>().unwrap(),
            ProgrammingLanguage::CSharp
        );
        assert_eq!(
            "cpp".parse::<ProgrammingLanguage>().unwrap(),
            ProgrammingLanguage::CPlusPlus
        );
        assert!("cobol".parse::<ProgrammingLanguage>().is_err());
    }
}
