//! Release selection and installer matching.

use chrono::{DateTime, Utc};

use crate::model::Release;
use crate::platform::PlatformFilter;

/// Select the latest stable release.
///
/// Releases are ordered by publication date, falling back to the creation
/// date. On equal timestamps the release listed first wins. Unparseable or
/// missing timestamps sort before any dated release.
pub fn latest_stable_release(releases: &[Release]) -> Option<&Release> {
    let mut latest: Option<(&Release, Option<DateTime<Utc>>)> = None;

    for release in releases.iter().filter(|r| r.is_stable()) {
        let ts = parse_timestamp(release.timestamp());
        match latest {
            Some((_, current)) if ts <= current => {}
            _ => latest = Some((release, ts)),
        }
    }

    latest.map(|(release, _)| release)
}

/// Whether a release ships at least one installer accepted by the filter.
pub fn is_installable(release: &Release, filter: PlatformFilter) -> bool {
    release
        .assets
        .iter()
        .any(|asset| filter.matches_asset(&asset.name))
}

/// The latest stable release of a list, if it is installable.
pub fn installable_release(releases: &[Release], filter: PlatformFilter) -> Option<&Release> {
    latest_stable_release(releases).filter(|release| is_installable(release, filter))
}

fn parse_timestamp(ts: Option<&str>) -> Option<DateTime<Utc>> {
    ts.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
