use anyhow::Result;
use log::debug;

use crate::discovery::DiscoveryCategory;

use super::config::Config;
use super::services::Services;
use super::{collect_query, print_results};

/// Show a curated discovery feed for the configured platform
#[tracing::instrument(skip(config))]
pub async fn discover(config: &Config, category: DiscoveryCategory, page: u32) -> Result<()> {
    debug!("Discovering {} for {} on page {}", category, config.platform, page);
    let services = Services::from_config(config)?;

    let handle = services.discovery.spawn_discover(category, page.max(1));
    let result = collect_query(handle).await;
    services.report_rate_limit();

    print_results(&result?);
    Ok(())
}
