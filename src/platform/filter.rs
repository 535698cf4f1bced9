use std::fmt;
use std::str::FromStr;

use super::Platform;

/// Platform restriction of a free-text search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlatformFilter {
    /// Any platform's installer counts
    #[default]
    All,
    Only(Platform),
}

impl PlatformFilter {
    /// Platforms whose installers satisfy this filter
    pub fn platforms(&self) -> Vec<Platform> {
        match self {
            PlatformFilter::All => Platform::ALL.to_vec(),
            PlatformFilter::Only(platform) => vec![*platform],
        }
    }

    pub fn matches_asset(&self, name: &str) -> bool {
        match self {
            PlatformFilter::All => Platform::ALL.iter().any(|p| p.matches_asset(name)),
            PlatformFilter::Only(platform) => platform.matches_asset(name),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFilter::All => "all",
            PlatformFilter::Only(platform) => platform.as_str(),
        }
    }
}

impl From<Platform> for PlatformFilter {
    fn from(platform: Platform) -> Self {
        PlatformFilter::Only(platform)
    }
}

impl fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(PlatformFilter::All);
        }
        s.parse::<Platform>().map(PlatformFilter::Only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<PlatformFilter>().unwrap(), PlatformFilter::All);
        assert_eq!(
            "linux".parse::<PlatformFilter>().unwrap(),
            PlatformFilter::Only(Platform::Linux)
        );
        assert!("plan9".parse::<PlatformFilter>().is_err());
    }

    #[test]
    fn test_all_matches_any_installer() {
        let filter = PlatformFilter::All;
        assert!(filter.matches_asset("a.apk"));
        assert!(filter.matches_asset("a.msi"));
        assert!(filter.matches_asset("a.dmg"));
        assert!(filter.matches_asset("a.AppImage"));
        assert!(!filter.matches_asset("a.tar.gz"));
        assert_eq!(filter.platforms().len(), 4);
    }

    #[test]
    fn test_only_matches_single_platform() {
        let filter = PlatformFilter::from(Platform::Macos);
        assert!(filter.matches_asset("a.dmg"));
        assert!(!filter.matches_asset("a.exe"));
        assert_eq!(filter.platforms(), vec![Platform::Macos]);
        assert_eq!(filter.to_string(), "macos");
    }
}
