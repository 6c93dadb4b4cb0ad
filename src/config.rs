// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Resolved configuration digest consumed by the stats engine.
//!
//! Filters arrive as comma-separated lists and truthy flags, matching the
//! environment-variable surface of the CLI. The digest is read-only for the
//! remainder of the run; mutable persisted counters live in
//! [`crate::store::StatsStore`].

use std::collections::{BTreeSet, HashSet};

use regex::Regex;

use crate::error::Error;

/// Filters, toggles and overrides that scope the statistics snapshot.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Account login the statistics are computed for.
    pub username: String,

    /// Repositories (owner/name) excluded from discovery.
    pub exclude_repos: HashSet<String>,

    /// Languages excluded from the aggregated language map.
    pub exclude_langs: HashSet<String>,

    /// Allow-list; when non-empty, only these repositories are accepted.
    pub only_included_repos: HashSet<String>,

    /// Repositories merged in via individual REST lookups after discovery.
    pub manually_added_repos: BTreeSet<String>,

    /// Repositories excluded from contribution-percentage statistics.
    pub exclude_collab_repos: HashSet<String>,

    /// Repositories treated as collaborative even when the collaborator
    /// listing reports otherwise.
    pub more_collab_repos: HashSet<String>,

    /// Accept forked repositories.
    pub include_forked_repos: bool,

    /// Skip the contributed-to connection during discovery.
    pub exclude_contrib_repos: bool,

    /// Reject archived repositories.
    pub exclude_archive_repos: bool,

    /// Reject private repositories.
    pub exclude_private_repos: bool,

    /// Reject public repositories.
    pub exclude_public_repos: bool,

    /// Persist view counters across runs.
    pub store_view_counts: bool,

    /// Manual addition applied to the final collaborator count.
    pub more_collaborators: u64
}

impl EngineConfig {
    /// Creates a digest for the given account with view persistence enabled
    /// and every filter empty.
    pub fn for_user<U>(username: U) -> Self
    where
        U: Into<String>
    {
        Self {
            username: username.into(),
            store_view_counts: true,
            ..Self::default()
        }
    }
}

/// Splits a comma-separated override list into a trimmed set.
///
/// `None` and blank input produce an empty set; blank segments are dropped.
pub fn parse_csv_set(raw: Option<&str>) -> HashSet<String> {
    raw.map(split_csv).unwrap_or_default()
}

/// Ordered variant of [`parse_csv_set`] for lists iterated during fetching.
pub fn parse_csv_ordered(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|value| split_csv(value).into_iter().collect()).unwrap_or_default()
}

fn split_csv(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interprets a raw override as a boolean flag.
///
/// Only the literal string `true` (case-insensitive, trimmed) enables the
/// flag; everything else, including absence, yields `default`.
pub fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw {
        Some(value) if !value.trim().is_empty() => value.trim().eq_ignore_ascii_case("true"),
        _ => default
    }
}

/// Interprets a raw override as an opt-out flag defaulting to enabled.
///
/// Mirrors the view-persistence toggle: anything except the literal `false`
/// keeps persistence on.
pub fn parse_opt_out_flag(raw: Option<&str>) -> bool {
    match raw {
        Some(value) if !value.trim().is_empty() => !value.trim().eq_ignore_ascii_case("false"),
        _ => true
    }
}

/// Validates a `YYYY-MM-DD` date override.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the value does not match the calendar
/// format. Callers fall back to the persisted value in that case.
pub fn validate_date(value: &str) -> Result<(), Error> {
    let pattern = Regex::new(r"^\d{4}-\d{2}-\d{2}$")
        .map_err(|e| Error::validation(format!("invalid date pattern: {e}")))?;

    if !pattern.is_match(value) {
        return Err(Error::validation(format!("'{value}' is not a YYYY-MM-DD date")));
    }

    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::validation(format!("'{value}' is not a calendar date: {e}")))?;

    Ok(())
}
