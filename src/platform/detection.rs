use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system family a release asset can be installed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Windows,
    Macos,
    Linux,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Android,
        Platform::Windows,
        Platform::Macos,
        Platform::Linux,
    ];

    /// Detect the current platform
    pub fn detect() -> Self {
        #[cfg(target_os = "android")]
        {
            Platform::Android
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "macos")]
        {
            Platform::Macos
        }
        #[cfg(not(any(target_os = "android", target_os = "windows", target_os = "macos")))]
        {
            Platform::Linux
        }
    }

    /// Lower-case name used in snapshot URLs and CLI arguments
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
        }
    }

    /// Installer file suffixes accepted on this platform (lower-case)
    pub fn installer_suffixes(&self) -> &'static [&'static str] {
        match self {
            Platform::Android => &[".apk"],
            Platform::Windows => &[".msi", ".exe"],
            Platform::Macos => &[".dmg", ".pkg"],
            Platform::Linux => &[".appimage", ".deb", ".rpm"],
        }
    }

    /// Check if an asset file name is an installer for this platform
    pub fn matches_asset(&self, name: &str) -> bool {
        let name_lower = name.to_lowercase();
        self.installer_suffixes()
            .iter()
            .any(|suffix| name_lower.ends_with(suffix))
    }

    /// Topic used to narrow curated discovery queries
    pub fn discovery_topic(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Windows => "desktop",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
        }
    }

    pub fn is_desktop(&self) -> bool {
        !matches!(self, Platform::Android)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "windows" | "win" => Ok(Platform::Windows),
            "macos" | "mac" | "darwin" => Ok(Platform::Macos),
            "linux" => Ok(Platform::Linux),
            _ => anyhow::bail!(
                "Unknown platform: {}. Expected android, windows, macos, or linux.",
                s
            ),
        }
    }
}
