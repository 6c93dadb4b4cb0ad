// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Memoized statistics snapshot for a single account.
//!
//! Every metric family lives in its own [`tokio::sync::OnceCell`]: a first
//! read triggers the underlying fetch sequence, concurrent reads share that
//! one computation, and later reads return the frozen value without I/O. A
//! metric that depends on another resolves the dependency through the same
//! cells, so consumers may request metrics in any order. The persisted
//! counters store is the only shared mutable resource and sits behind a
//! mutex.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt,
    sync::atomic::AtomicBool
};

use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::info;

use crate::{
    activity::{Involvement, count_involvement},
    authorship::{AuthorshipStats, collect_authorship},
    client::QueryClient,
    collaborators::{CollaboratorSurvey, survey_collaborators},
    config::EngineConfig,
    contributions::total_contributions,
    discovery::{Overview, collect_overview},
    error::Error,
    languages::LanguageStat,
    store::StatsStore,
    views::{ViewStats, reconcile_views}
};

/// Lazily resolved, memoized usage-statistics snapshot.
///
/// Accessors may be called in any order and concurrently; each underlying
/// fetch sequence executes at most once per process lifetime.
pub struct StatsEngine<Q> {
    client: Q,
    config: EngineConfig,
    store:  Mutex<StatsStore>,

    overview:      OnceCell<Overview>,
    contributions: OnceCell<u64>,
    survey:        OnceCell<CollaboratorSurvey>,
    authorship:    OnceCell<AuthorshipStats>,
    view_stats:    OnceCell<ViewStats>,
    pull_requests: OnceCell<u64>,
    issues:        OnceCell<u64>,

    /// Sticky across both involvement metrics for the rest of the run.
    rate_limited: AtomicBool
}

impl<Q> StatsEngine<Q>
where
    Q: QueryClient
{
    /// Creates an engine over the given transport, filter digest and
    /// persisted counters store.
    pub fn new(client: Q, config: EngineConfig, store: StatsStore) -> Self {
        Self {
            client,
            config,
            store: Mutex::new(store),
            overview: OnceCell::new(),
            contributions: OnceCell::new(),
            survey: OnceCell::new(),
            authorship: OnceCell::new(),
            view_stats: OnceCell::new(),
            pull_requests: OnceCell::new(),
            issues: OnceCell::new(),
            rate_limited: AtomicBool::new(false)
        }
    }

    async fn overview(&self) -> Result<&Overview, Error> {
        self.overview
            .get_or_try_init(|| collect_overview(&self.client, &self.config))
            .await
    }

    async fn survey(&self) -> Result<&CollaboratorSurvey, Error> {
        self.survey
            .get_or_try_init(|| async {
                let overview = self.overview().await?;
                survey_collaborators(&self.client, overview).await
            })
            .await
    }

    async fn authorship(&self) -> Result<&AuthorshipStats, Error> {
        self.authorship
            .get_or_try_init(|| async {
                let overview = self.overview().await?;
                let survey = self.survey().await?;
                collect_authorship(&self.client, &self.config, overview, &survey.collab_repos)
                    .await
            })
            .await
    }

    async fn view_stats(&self) -> Result<&ViewStats, Error> {
        self.view_stats
            .get_or_try_init(|| async {
                let overview = self.overview().await?;
                reconcile_views(
                    &self.client,
                    overview,
                    &self.store,
                    self.config.store_view_counts,
                    chrono::Local::now().date_naive()
                )
                .await
            })
            .await
    }

    /// Account display name, falling back to the login.
    pub async fn name(&self) -> Result<&str, Error> {
        Ok(&self.overview().await?.display_name)
    }

    /// Stargazer total across accepted repositories.
    pub async fn stargazers(&self) -> Result<u64, Error> {
        Ok(self.overview().await?.stargazers)
    }

    /// Fork total across accepted repositories.
    pub async fn forks(&self) -> Result<u64, Error> {
        Ok(self.overview().await?.forks)
    }

    /// Accepted repository keys.
    pub async fn repos(&self) -> Result<&BTreeSet<String>, Error> {
        Ok(&self.overview().await?.repos)
    }

    /// Aggregated language map with final proportions.
    pub async fn languages(&self) -> Result<&BTreeMap<String, LanguageStat>, Error> {
        Ok(&self.overview().await?.languages)
    }

    /// Language name to proportion-percent map.
    pub async fn languages_proportional(&self) -> Result<BTreeMap<String, f64>, Error> {
        Ok(self
            .overview()
            .await?
            .languages
            .iter()
            .map(|(name, stat)| (name.clone(), stat.proportion_percent))
            .collect())
    }

    /// Languages observed but configured out of the map.
    pub async fn excluded_languages(&self) -> Result<&BTreeSet<String>, Error> {
        Ok(&self.overview().await?.excluded_languages)
    }

    /// All-time contribution count.
    pub async fn total_contributions(&self) -> Result<u64, Error> {
        self.contributions
            .get_or_try_init(|| total_contributions(&self.client))
            .await
            .copied()
    }

    /// Lines added and deleted by the account across all repositories.
    pub async fn lines_changed(&self) -> Result<(u64, u64), Error> {
        let stats = self.authorship().await?;
        Ok((stats.additions, stats.deletions))
    }

    /// Mean contribution share over qualifying repositories, in percent.
    /// `None` means no repository qualified.
    pub async fn avg_contribution_percent(&self) -> Result<Option<f64>, Error> {
        Ok(self.authorship().await?.avg_contribution_percent)
    }

    /// Collaborator-weighted mean contribution share, in percent.
    pub async fn weighted_avg_contribution_percent(&self) -> Result<Option<f64>, Error> {
        Ok(self.authorship().await?.weighted_avg_contribution_percent)
    }

    /// Distinct author logins observed across all repositories.
    pub async fn contributors(&self) -> Result<&HashSet<String>, Error> {
        Ok(&self.authorship().await?.contributors)
    }

    /// Collaborator count: the union of surveyed collaborators and observed
    /// contributors, minus the account owner, plus the manual override.
    pub async fn collaborators(&self) -> Result<u64, Error> {
        let survey = self.survey().await?;
        let contributors = &self.authorship().await?.contributors;

        let union = survey.collaborators.union(contributors).count() as u64;
        Ok(union.saturating_sub(1) + self.config.more_collaborators)
    }

    /// Cumulative view count including today's same-day views.
    pub async fn views(&self) -> Result<u64, Error> {
        Ok(self.view_stats().await?.total)
    }

    /// First date included in the view count.
    pub async fn views_from_date(&self) -> Result<&str, Error> {
        Ok(&self.view_stats().await?.from_date)
    }

    /// Pull requests involving the account, never below the persisted count.
    pub async fn pull_requests(&self) -> Result<u64, Error> {
        self.pull_requests
            .get_or_try_init(|| async {
                let overview = self.overview().await?;
                let fresh = count_involvement(
                    &self.client,
                    overview,
                    &self.config.username,
                    Involvement::PullRequests,
                    &self.rate_limited
                )
                .await?;

                let mut store = self.store.lock().await;
                let resolved = fresh.max(store.pull_requests());
                store.set_pull_requests(resolved)?;
                Ok(resolved)
            })
            .await
            .copied()
    }

    /// Issues involving the account, never below the persisted count.
    pub async fn issues(&self) -> Result<u64, Error> {
        self.issues
            .get_or_try_init(|| async {
                let overview = self.overview().await?;
                let fresh = count_involvement(
                    &self.client,
                    overview,
                    &self.config.username,
                    Involvement::Issues,
                    &self.rate_limited
                )
                .await?;

                let mut store = self.store.lock().await;
                let resolved = fresh.max(store.issues());
                store.set_issues(resolved)?;
                Ok(resolved)
            })
            .await
            .copied()
    }

    /// Resolves every metric and assembles the combined summary.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal failure of any underlying fetch sequence.
    pub async fn summary(&self) -> Result<Summary, Error> {
        let (additions, deletions) = self.lines_changed().await?;
        let contributors = self.contributors().await?;

        let summary = Summary {
            name: self.name().await?.to_string(),
            stargazers: self.stargazers().await?,
            forks: self.forks().await?,
            pull_requests: self.pull_requests().await?,
            issues: self.issues().await?,
            total_contributions: self.total_contributions().await?,
            repo_count: self.repos().await?.len(),
            lines_added: additions,
            lines_deleted: deletions,
            avg_contribution_percent: self.avg_contribution_percent().await?,
            weighted_avg_contribution_percent: self
                .weighted_avg_contribution_percent()
                .await?,
            views: self.views().await?,
            views_from_date: self.views_from_date().await?.to_string(),
            collaborators: self.collaborators().await?,
            contributor_count: contributors.len().saturating_sub(1),
            languages: self.languages_proportional().await?,
            excluded_language_count: self.excluded_languages().await?.len()
        };

        info!("snapshot complete for {}", summary.name);
        Ok(summary)
    }
}

/// Combined human-readable snapshot of every metric.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub name: String,
    pub stargazers: u64,
    pub forks: u64,
    pub pull_requests: u64,
    pub issues: u64,
    pub total_contributions: u64,
    pub repo_count: usize,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub avg_contribution_percent: Option<f64>,
    pub weighted_avg_contribution_percent: Option<f64>,
    pub views: u64,
    pub views_from_date: String,
    pub collaborators: u64,
    pub contributor_count: usize,
    pub languages: BTreeMap<String, f64>,
    pub excluded_language_count: usize
}

/// Groups digits in threes for display.
fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

/// Formats an optional percentage, reporting `N/A` when no repo qualified.
fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(percent) => format!("{percent:.2}%"),
        None => "N/A".to_string()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GitHub repository statistics for {}:", self.name)?;
        writeln!(f, "  Stargazers: {}", thousands(self.stargazers))?;
        writeln!(f, "  Forks: {}", thousands(self.forks))?;
        writeln!(f, "  Pull requests: {}", thousands(self.pull_requests))?;
        writeln!(f, "  Issues: {}", thousands(self.issues))?;
        writeln!(
            f,
            "  All-time contributions: {}",
            thousands(self.total_contributions)
        )?;
        writeln!(
            f,
            "  Repositories with contributions: {}",
            thousands(self.repo_count as u64)
        )?;
        writeln!(f, "  Lines of code added: {}", thousands(self.lines_added))?;
        writeln!(f, "  Lines of code deleted: {}", thousands(self.lines_deleted))?;
        writeln!(
            f,
            "  Total lines of code changed: {}",
            thousands(self.lines_added + self.lines_deleted)
        )?;
        writeln!(
            f,
            "  Avg. contribution share (per collab repo): {}",
            format_percent(self.avg_contribution_percent)
        )?;
        writeln!(
            f,
            "  Weighted avg. contribution share (per collab repo): {}",
            format_percent(self.weighted_avg_contribution_percent)
        )?;
        writeln!(f, "  Repository page views: {}", thousands(self.views))?;
        writeln!(f, "  Repository page views since: {}", self.views_from_date)?;
        writeln!(f, "  Collaborators: {}", thousands(self.collaborators))?;
        writeln!(f, "  Contributors: {}", thousands(self.contributor_count as u64))?;
        writeln!(
            f,
            "  Languages: {} (+{} excluded)",
            self.languages.len(),
            self.excluded_language_count
        )?;
        for (language, proportion) in &self.languages {
            writeln!(f, "    - {language}: {proportion:.4}%")?;
        }
        Ok(())
    }
}
