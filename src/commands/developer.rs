use anyhow::Result;
use log::debug;

use crate::model::{DeveloperProfile, DeveloperRepository};

use super::config::Config;
use super::services::Services;

/// Show a developer's profile and their repositories' release status
#[tracing::instrument(skip(config))]
pub async fn developer(config: &Config, username: &str) -> Result<()> {
    debug!("Loading developer {}", username);
    let services = Services::from_config(config)?;

    let profile = services.discovery.developer_profile(username).await?;
    let repos = services.discovery.developer_repositories(username).await;
    services.report_rate_limit();
    let repos = repos?;

    print_profile(&profile);
    println!();
    if repos.is_empty() {
        println!("No repositories found.");
    }
    for repo in &repos {
        println!("{}", format_developer_repo(repo));
    }
    Ok(())
}

fn print_profile(profile: &DeveloperProfile) {
    match &profile.name {
        Some(name) => println!("{} ({})", name, profile.login),
        None => println!("{}", profile.login),
    }
    if let Some(bio) = profile.bio.as_deref().filter(|b| !b.trim().is_empty()) {
        println!("{}", bio.trim());
    }
    println!(
        "Repositories: {}  Followers: {}  Following: {}",
        profile.public_repos, profile.followers, profile.following
    );
}

fn format_developer_repo(repo: &DeveloperRepository) -> String {
    let status = match (&repo.latest_version, repo.has_releases) {
        (Some(version), _) => format!("installable {}", version),
        (None, true) => "no installer".to_string(),
        (None, false) => "no releases".to_string(),
    };
    format!(
        "{} (★ {}) [{}]",
        repo.repo.full_name, repo.repo.stargazers_count, status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OwnedRepository;

    fn repo(latest_version: Option<&str>, has_releases: bool) -> DeveloperRepository {
        DeveloperRepository {
            repo: OwnedRepository {
                full_name: "octo/tool".into(),
                stargazers_count: 7,
                ..Default::default()
            },
            has_releases,
            has_installable_assets: latest_version.is_some(),
            latest_version: latest_version.map(String::from),
        }
    }

    #[test]
    fn test_format_developer_repo() {
        assert_eq!(
            format_developer_repo(&repo(Some("v1.2.0"), true)),
            "octo/tool (★ 7) [installable v1.2.0]"
        );
        assert_eq!(
            format_developer_repo(&repo(None, true)),
            "octo/tool (★ 7) [no installer]"
        );
        assert_eq!(
            format_developer_repo(&repo(None, false)),
            "octo/tool (★ 7) [no releases]"
        );
    }
}
