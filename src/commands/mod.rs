use anyhow::Result;
use log::debug;

use crate::discovery::{QueryEvent, QueryHandle, ResultAccumulator};
use crate::model::RepositorySummary;

pub mod config;
mod developer;
mod discover;
mod search;
pub mod services;

pub use developer::developer;
pub use discover::discover;
pub use search::search;

/// Drain a query into an accumulator, reporting progress on stderr.
pub(crate) async fn collect_query(mut handle: QueryHandle) -> Result<ResultAccumulator> {
    let mut results = ResultAccumulator::new();
    let mut batches = 0;

    while let Some(event) = handle.recv().await {
        match event {
            QueryEvent::Batch(batch) => {
                batches += 1;
                results.apply(batch);
                if results.has_more() {
                    eprintln!("Found {} so far...", results.repos().len());
                }
            }
            QueryEvent::Failed(failure) => anyhow::bail!("{}", failure),
        }
    }

    debug!("Query finished after {} batch(es)", batches);
    Ok(results)
}

pub(crate) fn format_repo_line(repo: &RepositorySummary) -> String {
    let mut line = format!("{} (★ {})", repo.full_name, repo.stargazers_count);
    if let Some(language) = &repo.language {
        line.push_str(&format!(" [{}]", language));
    }
    if let Some(description) = repo.description.as_deref().filter(|d| !d.trim().is_empty()) {
        line.push_str(&format!(" - {}", description.trim()));
    }
    line
}

pub(crate) fn print_results(results: &ResultAccumulator) {
    if results.repos().is_empty() {
        println!("No results found.");
    } else {
        for repo in results.repos() {
            println!("{}", format_repo_line(repo));
        }
    }

    if let Some(total) = results.total_count() {
        debug!("Remote reported {} matching repositories", total);
    }
    if results.has_more() {
        println!("\nMore results available (--page {}).", results.next_page_index());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepositoryOwner;

    #[test]
    fn test_format_repo_line() {
        let mut repo = RepositorySummary {
            full_name: "octo/tool".into(),
            stargazers_count: 42,
            owner: RepositoryOwner::default(),
            ..Default::default()
        };
        assert_eq!(format_repo_line(&repo), "octo/tool (★ 42)");

        repo.language = Some("Rust".into());
        repo.description = Some(" A tool \n".into());
        assert_eq!(format_repo_line(&repo), "octo/tool (★ 42) [Rust] - A tool");

        repo.description = Some("   ".into());
        assert_eq!(format_repo_line(&repo), "octo/tool (★ 42) [Rust]");
    }
}
