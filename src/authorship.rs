// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Lines-changed totals and contribution-percentage statistics.
//!
//! For every accepted non-empty repository the weekly contributor statistics
//! are attributed to "self" or "others". A repository qualifies for the
//! percentage averages only with positive self-changes and evidence of
//! collaboration; without qualifying repositories the averages report as not
//! applicable rather than zero.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    client::QueryClient, config::EngineConfig, discovery::Overview, error::Error
};

/// Author logins whose activity never counts as the account's own.
const EXCLUDED_AUTHORS: &[&str] = &["dependabot[bot]"];

/// Weekly contributor statistics entry as returned by the service.
#[derive(Debug, Deserialize)]
struct AuthorEntry {
    author: AuthorIdentity,
    #[serde(default)]
    weeks:  Vec<WeeklyChanges>
}

#[derive(Debug, Deserialize)]
struct AuthorIdentity {
    login: String
}

#[derive(Debug, Deserialize)]
struct WeeklyChanges {
    #[serde(default)]
    a: u64,
    #[serde(default)]
    d: u64
}

/// Aggregated authorship metrics across all accepted repositories.
#[derive(Debug, Clone)]
pub struct AuthorshipStats {
    /// Lines added by the account.
    pub additions: u64,
    /// Lines deleted by the account.
    pub deletions: u64,
    /// Mean contribution share over qualifying repositories, in percent.
    pub avg_contribution_percent: Option<f64>,
    /// Mean share discounted by collaborator count, in percent.
    pub weighted_avg_contribution_percent: Option<f64>,
    /// Distinct author logins observed across all repositories.
    pub contributors: HashSet<String>
}

/// Per-repository attribution tallies.
#[derive(Debug, Default, PartialEq)]
struct RepoAuthorship {
    self_additions: u64,
    self_deletions: u64,
    others_changes: u64,
    /// Distinct authors including the account itself, seeded at one.
    collaborator_count: u64
}

impl RepoAuthorship {
    fn self_changes(&self) -> u64 {
        self.self_additions + self.self_deletions
    }
}

/// Folds one repository's contributor entries into attribution tallies,
/// inserting every well-formed author login into `contributors`. Malformed
/// entries are skipped without failing the repository.
fn aggregate_repo(
    entries: &[Value],
    username: &str,
    contributors: &mut HashSet<String>
) -> RepoAuthorship {
    let mut tally = RepoAuthorship {
        collaborator_count: 1,
        ..RepoAuthorship::default()
    };
    let mut other_authors: HashSet<String> = HashSet::new();

    for raw in entries {
        let Ok(entry) = serde_json::from_value::<AuthorEntry>(raw.clone()) else {
            debug!("skipping malformed contributor entry");
            continue;
        };

        contributors.insert(entry.author.login.clone());

        let is_self = entry.author.login == username
            && !EXCLUDED_AUTHORS.contains(&entry.author.login.as_str());

        if is_self {
            for week in &entry.weeks {
                tally.self_additions += week.a;
                tally.self_deletions += week.d;
            }
        } else {
            for week in &entry.weeks {
                tally.others_changes += week.a + week.d;
            }
            other_authors.insert(entry.author.login);
        }
    }

    tally.collaborator_count += other_authors.len() as u64;
    tally
}

/// Decides whether a repository counts toward the percentage averages.
fn qualifies(
    repo: &str,
    tally: &RepoAuthorship,
    config: &EngineConfig,
    collab_repos: &HashSet<String>
) -> bool {
    !config.exclude_collab_repos.contains(repo)
        && tally.self_changes() > 0
        && (tally.others_changes > 0
            || collab_repos.contains(repo)
            || config.more_collab_repos.contains(repo))
}

/// Computes lines-changed totals, contribution percentages and the global
/// contributor set.
///
/// `collab_repos` comes from the collaborator survey and marks repositories
/// whose collaborator listing proved more than one member.
///
/// # Errors
///
/// Propagates transport failures from the query client.
pub async fn collect_authorship<Q>(
    client: &Q,
    config: &EngineConfig,
    overview: &Overview,
    collab_repos: &HashSet<String>
) -> Result<AuthorshipStats, Error>
where
    Q: QueryClient
{
    let mut contributors = HashSet::new();
    let mut additions = 0u64;
    let mut deletions = 0u64;
    let mut percentages: Vec<f64> = Vec::new();
    let mut weighted: Vec<f64> = Vec::new();

    for repo in overview.non_empty_repos() {
        let entries = client
            .query_paginated(&format!("/repos/{repo}/stats/contributors"))
            .await?;

        let tally = aggregate_repo(&entries, &config.username, &mut contributors);
        additions += tally.self_additions;
        deletions += tally.self_deletions;

        if !qualifies(repo, &tally, config, collab_repos) {
            continue;
        }

        let total_changes = tally.self_changes() + tally.others_changes;
        let share = tally.self_changes() as f64 / total_changes as f64;
        percentages.push(share);

        let discount = if tally.collaborator_count > 1 {
            1.0 - 1.0 / tally.collaborator_count as f64
        } else {
            1.0
        };
        weighted.push(share * discount);
    }

    let avg_contribution_percent = mean_percent(&percentages);
    let weighted_avg_contribution_percent = mean_percent(&weighted);

    info!(
        "authorship: +{} -{} over {} qualifying repositories",
        additions,
        deletions,
        percentages.len()
    );

    Ok(AuthorshipStats {
        additions,
        deletions,
        avg_contribution_percent,
        weighted_avg_contribution_percent,
        contributors
    })
}

fn mean_percent(shares: &[f64]) -> Option<f64> {
    if shares.is_empty() {
        return None;
    }
    Some(shares.iter().sum::<f64>() / shares.len() as f64 * 100.0)
}
