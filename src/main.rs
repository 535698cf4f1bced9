use anyhow::Result;
use clap::Parser;
use ghstore::commands::{self, config::Config};
use ghstore::discovery::{DiscoveryCategory, ProgrammingLanguage, SearchParams};
use ghstore::platform::{Platform, PlatformFilter};
use ghstore::source::SortKey;

/// ghstore - discover installable apps published as GitHub releases
///
/// Searches GitHub for repositories whose latest stable release ships an
/// installer for your platform.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// This is useful for avoiding rate limits.
///
/// Examples:
///   ghstore search "note taking"     # Search apps for the current platform
///   ghstore discover trending        # Show trending apps
///   ghstore developer octocat        # Show a developer's apps
#[derive(Parser, Debug)]
#[command(author, version = env!("GHSTORE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", env = "GHSTORE_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Base URL of pre-computed discovery snapshots
    #[arg(
        long = "snapshot-url",
        env = "GHSTORE_SNAPSHOT_URL",
        value_name = "URL",
        global = true
    )]
    pub snapshot_url: Option<String>,

    /// Always query the live API instead of snapshots
    #[arg(long = "no-snapshot", global = true)]
    pub no_snapshot: bool,

    /// Target platform (android, windows, macos, linux; defaults to the current one)
    #[arg(long, short = 'p', value_name = "PLATFORM", global = true)]
    pub platform: Option<Platform>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, hide = true)]
    pub token: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Search repositories that ship installers
    Search(SearchArgs),

    /// Show a curated feed of apps
    Discover(DiscoverArgs),

    /// Show a developer's profile and apps
    Developer(DeveloperArgs),
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Search text; empty lists popular apps
    #[arg(value_name = "QUERY", default_value = "")]
    pub query: String,

    /// Limit to installers of one platform, or "all"
    #[arg(long, value_name = "FILTER")]
    pub filter: Option<PlatformFilter>,

    /// Programming language of the repository
    #[arg(long, short = 'l', value_name = "LANGUAGE")]
    pub language: Option<ProgrammingLanguage>,

    /// Sort by stars, forks or updated (best match when omitted)
    #[arg(long, short = 's', value_name = "KEY")]
    pub sort: Option<SortKey>,

    /// Result page
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,
}

#[derive(clap::Args, Debug)]
pub struct DiscoverArgs {
    /// trending, hot-release or most-popular
    #[arg(value_name = "CATEGORY")]
    pub category: DiscoveryCategory,

    /// Result page
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,
}

#[derive(clap::Args, Debug)]
pub struct DeveloperArgs {
    /// GitHub user name
    #[arg(value_name = "USERNAME")]
    pub username: String,
}

impl Cli {
    fn config(&self) -> Config {
        Config::new(
            self.api_url.clone(),
            self.token.clone(),
            self.snapshot_url.clone(),
            self.no_snapshot,
            self.platform,
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = cli.config();

    match cli.command {
        Commands::Search(args) => {
            let params = SearchParams {
                text: args.query,
                filter: args.filter.unwrap_or(PlatformFilter::Only(config.platform)),
                language: args.language,
                sort: args.sort,
                page: args.page,
            };
            commands::search(&config, params).await?
        }
        Commands::Discover(args) => commands::discover(&config, args.category, args.page).await?,
        Commands::Developer(args) => commands::developer(&config, &args.username).await?,
    }
    Ok(())
}
