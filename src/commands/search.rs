use anyhow::Result;
use log::debug;

use crate::discovery::SearchParams;

use super::config::Config;
use super::services::Services;
use super::{collect_query, print_results};

/// Search repositories that ship installers
#[tracing::instrument(skip(config))]
pub async fn search(config: &Config, params: SearchParams) -> Result<()> {
    debug!("Searching for {:?} on page {}", params.text, params.page);
    let services = Services::from_config(config)?;

    let handle = services.discovery.spawn_search(params);
    let result = collect_query(handle).await;
    services.report_rate_limit();

    print_results(&result?);
    Ok(())
}
