//! Target platform discrimination
//!
//! This module provides the [`Platform`] a discovery query targets (detected
//! at compile time by default) and the [`PlatformFilter`] used by free-text
//! search, together with the installer file types each platform accepts.

mod detection;
mod filter;

pub use detection::Platform;
pub use filter::PlatformFilter;
