//! Heuristic relevance scoring of search results.
//!
//! Weights are tuned by hand. The only hard rule is that a score of zero or
//! less drops the candidate before any release check is made.

use crate::model::RepositorySummary;
use crate::platform::{Platform, PlatformFilter};

/// Maximum number of candidates verified per fetched page.
pub const MAX_CANDIDATES_PER_PAGE: usize = 50;

const BASE_SCORE: i32 = 5;

const DESKTOP_TOPICS: &[&str] = &["desktop", "electron", "app", "gui", "compose-desktop"];
const CROSS_PLATFORM_TOPICS: &[&str] = &["cross-platform", "multiplatform"];
const DESKTOP_LANGUAGES: &[&str] = &["kotlin", "c++", "rust", "c#", "swift", "dart"];
const NON_APP_TOPICS: &[&str] = &["library", "sdk", "framework"];
const TUTORIAL_TOPICS: &[&str] = &["tutorial", "course", "examples", "learning"];

/// Relevance of a repository for a platform.
pub fn score(repo: &RepositorySummary, platform: Platform) -> i32 {
    let topics: Vec<String> = repo.topics.iter().map(|t| t.to_lowercase()).collect();
    let has_topic = |t: &str| topics.iter().any(|topic| topic == t);
    let has_any_topic = |ts: &[&str]| ts.iter().any(|&t| has_topic(t));
    let language = repo.language.as_deref().map(str::to_lowercase);
    let description = repo
        .description
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();

    let mut score = BASE_SCORE;

    if platform.is_desktop() {
        if has_any_topic(DESKTOP_TOPICS) {
            score += 10;
        }
        if has_any_topic(CROSS_PLATFORM_TOPICS) {
            score += 8;
        }
        if language
            .as_deref()
            .is_some_and(|l| DESKTOP_LANGUAGES.contains(&l))
        {
            score += 5;
        }
        if description.contains("desktop") || description.contains("application") {
            score += 3;
        }
    } else {
        if has_topic("android") {
            score += 10;
        }
        if has_topic("mobile") {
            score += 5;
        }
        if matches!(language.as_deref(), Some("kotlin") | Some("java")) {
            score += 5;
        }
        if description.contains("android") || description.contains("apk") {
            score += 3;
        }
    }

    let name = repo.name.to_lowercase();
    if name.starts_with("awesome-") || has_topic("awesome") || has_topic("awesome-list") {
        score -= 10;
    }
    if name == "dotfiles" || has_topic("dotfiles") {
        score -= 10;
    }
    if has_any_topic(NON_APP_TOPICS) {
        score -= 4;
    }
    if has_any_topic(TUTORIAL_TOPICS) {
        score -= 4;
    }

    score
}

/// Relevance under a platform filter: the best score of any allowed platform.
pub fn score_for_filter(repo: &RepositorySummary, filter: PlatformFilter) -> i32 {
    filter
        .platforms()
        .into_iter()
        .map(|platform| score(repo, platform))
        .max()
        .unwrap_or(0)
}

/// Drop irrelevant repositories, keeping API order, capped at `limit`.
pub fn select_candidates(
    items: &[RepositorySummary],
    filter: PlatformFilter,
    limit: usize,
) -> Vec<RepositorySummary> {
    items
        .iter()
        .filter(|repo| score_for_filter(repo, filter) > 0)
        .take(limit)
        .cloned()
        .collect()
}
