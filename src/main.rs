// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface for the octostats binary.
//!
//! Every option doubles as an environment variable so the binary drops into a
//! scheduled workflow without arguments. The run resolves the full statistics
//! snapshot and prints it as text or JSON.

use std::{path::PathBuf, process};

use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use octostats::{
    DATE_SENTINEL, EngineConfig, Error, GithubClient, StatsEngine, StatsStore,
    parse_csv_ordered, parse_csv_set, parse_flag, parse_opt_out_flag, validate_date
};
use tracing::warn;

/// Command line interface for the GitHub statistics snapshot.
#[derive(Debug, Parser)]
#[command(name = "octostats", version, about = "Aggregate GitHub usage statistics")]
struct Cli {
    /// Account login the statistics are computed for.
    #[arg(long, env = "GITHUB_ACTOR", value_name = "LOGIN")]
    user: String,

    /// Personal access token used for all API calls.
    #[arg(long, env = "ACCESS_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    token: String,

    /// Comma-separated repositories (owner/name) excluded from discovery.
    #[arg(long, env = "EXCLUDED", value_name = "LIST")]
    excluded: Option<String>,

    /// Comma-separated languages excluded from the language map.
    #[arg(long, env = "EXCLUDED_LANGS", value_name = "LIST")]
    excluded_langs: Option<String>,

    /// Allow-list; when set, only these repositories are accepted.
    #[arg(long, env = "ONLY_INCLUDED", value_name = "LIST")]
    only_included: Option<String>,

    /// Repositories merged in via individual lookups after discovery.
    #[arg(long, env = "MORE_REPOS", value_name = "LIST")]
    more_repos: Option<String>,

    /// Repositories excluded from contribution-percentage statistics.
    #[arg(long, env = "EXCLUDED_COLLAB_REPOS", value_name = "LIST")]
    excluded_collab_repos: Option<String>,

    /// Repositories treated as collaborative regardless of their listing.
    #[arg(long, env = "MORE_COLLAB_REPOS", value_name = "LIST")]
    more_collab_repos: Option<String>,

    /// Accept forked repositories ("true" enables).
    #[arg(long, env = "INCLUDE_FORKED_REPOS", value_name = "FLAG")]
    include_forked_repos: Option<String>,

    /// Skip the contributed-to connection during discovery.
    #[arg(long, env = "EXCLUDE_CONTRIB_REPOS", value_name = "FLAG")]
    exclude_contrib_repos: Option<String>,

    /// Reject archived repositories.
    #[arg(long, env = "EXCLUDE_ARCHIVE_REPOS", value_name = "FLAG")]
    exclude_archive_repos: Option<String>,

    /// Reject private repositories.
    #[arg(long, env = "EXCLUDE_PRIVATE_REPOS", value_name = "FLAG")]
    exclude_private_repos: Option<String>,

    /// Reject public repositories.
    #[arg(long, env = "EXCLUDE_PUBLIC_REPOS", value_name = "FLAG")]
    exclude_public_repos: Option<String>,

    /// Persist view counters across runs; "false" disables and resets them.
    #[arg(long, env = "STORE_REPO_VIEWS", value_name = "FLAG")]
    store_repo_views: Option<String>,

    /// Manual addition applied to the final collaborator count.
    #[arg(long, env = "MORE_COLLABS", value_name = "COUNT")]
    more_collabs: Option<String>,

    /// Seeds the cumulative view counter; requires a valid --last-viewed.
    #[arg(long, env = "REPO_VIEWS", value_name = "COUNT")]
    repo_views: Option<String>,

    /// Last date already folded into the seeded view counter (YYYY-MM-DD).
    #[arg(long, env = "LAST_VIEWED", value_name = "DATE")]
    last_viewed: Option<String>,

    /// Overrides the first date covered by the view counter (YYYY-MM-DD).
    #[arg(long, env = "FIRST_VIEWED", value_name = "DATE")]
    first_viewed: Option<String>,

    /// Path of the persisted counters file.
    #[arg(
        long,
        env = "STATS_STORE_PATH",
        value_name = "PATH",
        default_value = "github_stats_store.json"
    )]
    store_path: PathBuf,

    /// Print the snapshot as JSON instead of text.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool
}

/// Resolves CLI overrides into the engine's configuration digest.
fn build_config(cli: &Cli) -> EngineConfig {
    let mut config = EngineConfig::for_user(cli.user.clone());

    config.exclude_repos = parse_csv_set(cli.excluded.as_deref());
    config.exclude_langs = parse_csv_set(cli.excluded_langs.as_deref());
    config.only_included_repos = parse_csv_set(cli.only_included.as_deref());
    config.manually_added_repos = parse_csv_ordered(cli.more_repos.as_deref());
    config.exclude_collab_repos = parse_csv_set(cli.excluded_collab_repos.as_deref());
    config.more_collab_repos = parse_csv_set(cli.more_collab_repos.as_deref());

    config.include_forked_repos = parse_flag(cli.include_forked_repos.as_deref(), false);
    config.exclude_contrib_repos = parse_flag(cli.exclude_contrib_repos.as_deref(), false);
    config.exclude_archive_repos = parse_flag(cli.exclude_archive_repos.as_deref(), false);
    config.exclude_private_repos = parse_flag(cli.exclude_private_repos.as_deref(), false);
    config.exclude_public_repos = parse_flag(cli.exclude_public_repos.as_deref(), false);
    config.store_view_counts = parse_opt_out_flag(cli.store_repo_views.as_deref());

    config.more_collaborators = cli
        .more_collabs
        .as_deref()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0);

    config
}

/// Applies manual view-counter overrides before the engine starts.
///
/// Seeding the counter requires both a count and a valid last-viewed date;
/// anything less is ignored with a warning so a typo cannot zero the history.
fn apply_store_overrides(
    store: &mut StatsStore,
    config: &EngineConfig,
    cli: &Cli
) -> Result<(), Error> {
    if !config.store_view_counts {
        store.set_views_count(0)?;
        store.set_views_from_date(DATE_SENTINEL)?;
        store.set_views_to_date(DATE_SENTINEL)?;
        return Ok(());
    }

    if let Some(raw_count) = cli.repo_views.as_deref() {
        let count = raw_count.trim().parse::<u64>().ok();
        let last_viewed = cli
            .last_viewed
            .as_deref()
            .filter(|date| validate_date(date).is_ok());

        match (count, last_viewed) {
            (Some(count), Some(date)) => {
                store.set_views_count(count)?;
                store.set_views_to_date(date)?;
            }
            _ => warn!("ignoring view counter seed: needs a count and a valid last-viewed date")
        }
    }

    if let Some(date) = cli.first_viewed.as_deref() {
        match validate_date(date) {
            Ok(()) => store.set_views_from_date(date)?,
            Err(error) => warn!("ignoring first-viewed override: {}", error)
        }
    }

    Ok(())
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main() {
    if let Err(error) = run() {
        eprintln!("{}", error.to_display_string());
        process::exit(1);
    }
}

/// Executes the snapshot run end to end.
///
/// # Errors
///
/// Propagates configuration, store and transport failures.
#[tokio::main]
async fn run() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli);

    let mut store = StatsStore::open(&cli.store_path)?;
    apply_store_overrides(&mut store, &config, &cli)?;

    let client = GithubClient::new(&cli.token)?;
    let engine = StatsEngine::new(client, config, store);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.yellow} [{elapsed_precise}] {msg}")
            .map_err(|e| Error::validation(format!("invalid spinner template: {e}")))?
    );
    spinner.set_message("Crunching GitHub statistics...");

    // Both consumers resolve concurrently and share every underlying fetch.
    let (summary, languages) = tokio::join!(engine.summary(), engine.languages());
    let summary = summary?;
    let languages = languages?;

    spinner.finish_and_clear();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
        println!("Language sizes:");
        for (name, stat) in languages {
            let color = stat.color.as_deref().unwrap_or("-");
            println!("    {name}: {} bytes across {} repos ({color})", stat.size, stat.occurrences);
        }
    }

    Ok(())
}
