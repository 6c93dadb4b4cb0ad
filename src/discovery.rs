// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository discovery and filtering.
//!
//! Paginate the owned and contributed-to connections in lock-step until
//! neither reports a further page, merge manually added repositories via
//! individual REST lookups, and accumulate star/fork totals and the language
//! map along the way. Name exclusion is evaluated before type exclusion; a
//! repository is inserted into the set only after passing both.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    client::{LanguageColor, QueryClient},
    config::EngineConfig,
    error::Error,
    languages::{LanguageAccumulator, LanguageStat},
    queries
};

const NO_NAME: &str = "No Name";
const OTHER_LANGUAGE: &str = "Other";

/// One language listing entry of a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageEdge {
    /// Language name, `"Other"` when the service omits it.
    pub name:  String,
    /// Bytes written in this language.
    pub size:  u64,
    /// Display color, when assigned.
    pub color: Option<String>
}

/// Snapshot of one candidate repository, merged from a graph-query node or a
/// REST lookup. Immutable once accepted into the discovered set.
#[derive(Debug, Clone)]
pub struct RepoRecord {
    /// Globally unique owner/name key.
    pub name: String,
    /// Repository is a fork.
    pub is_fork: bool,
    /// Repository is archived.
    pub is_archived: bool,
    /// Repository is private.
    pub is_private: bool,
    /// Repository reports zero content.
    pub is_empty: bool,
    /// Stargazer count.
    pub stargazers: u64,
    /// Fork count.
    pub forks: u64,
    /// Ordered language listing; empty for REST records, whose languages come
    /// from a separate flat lookup.
    pub language_edges: Vec<LanguageEdge>
}

impl RepoRecord {
    /// Parses a graph-query repository node.
    ///
    /// Returns `None` for null or structurally unusable nodes, which are
    /// skipped without failing the page.
    pub fn from_graph_node(node: &Value) -> Option<Self> {
        let name = node.get("nameWithOwner")?.as_str()?.to_string();

        let language_edges = node
            .pointer("/languages/edges")
            .and_then(Value::as_array)
            .map(|edges| edges.iter().filter_map(parse_language_edge).collect())
            .unwrap_or_default();

        Some(Self {
            name,
            is_fork: truthy(node.get("isFork")),
            is_archived: truthy(node.get("isArchived")),
            is_private: truthy(node.get("isPrivate")),
            is_empty: truthy(node.get("isEmpty")),
            stargazers: node
                .pointer("/stargazers/totalCount")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            forks: node.get("forkCount").and_then(Value::as_u64).unwrap_or(0),
            language_edges
        })
    }

    /// Builds a record for a manually added repository from its REST
    /// document, which uses a different key vocabulary than the graph nodes.
    pub fn from_rest(name: &str, document: &Value) -> Self {
        Self {
            name: name.to_string(),
            is_fork: truthy(document.get("fork")),
            is_archived: truthy(document.get("archived")),
            is_private: truthy(document.get("private")),
            is_empty: document.get("size").and_then(Value::as_u64).unwrap_or(0) == 0,
            stargazers: document.get("stargazers_count").and_then(Value::as_u64).unwrap_or(0),
            forks: document.get("forks").and_then(Value::as_u64).unwrap_or(0),
            language_edges: Vec::new()
        }
    }
}

fn truthy(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(false)
}

fn parse_language_edge(edge: &Value) -> Option<LanguageEdge> {
    let size = edge.get("size").and_then(Value::as_u64).unwrap_or(0);
    let name = edge
        .pointer("/node/name")
        .and_then(Value::as_str)
        .unwrap_or(OTHER_LANGUAGE)
        .to_string();
    let color = edge.pointer("/node/color").and_then(Value::as_str).map(str::to_string);

    Some(LanguageEdge {
        name,
        size,
        color
    })
}

/// Rejects a candidate by key: already discovered, absent from a non-empty
/// allow-list, or explicitly excluded.
pub fn is_name_invalid(name: &str, repos: &BTreeSet<String>, config: &EngineConfig) -> bool {
    repos.contains(name)
        || (!config.only_included_repos.is_empty() && !config.only_included_repos.contains(name))
        || config.exclude_repos.contains(name)
}

/// Rejects a candidate by kind: fork without opt-in, archived, private or
/// public with the matching exclusion enabled.
pub fn is_type_excluded(record: &RepoRecord, config: &EngineConfig) -> bool {
    (!config.include_forked_repos && record.is_fork)
        || (config.exclude_archive_repos && record.is_archived)
        || (config.exclude_private_repos && record.is_private)
        || (config.exclude_public_repos && !record.is_private)
}

/// Completed discovery output: the frozen repository sets, incremental
/// star/fork totals and the finalized language map.
#[derive(Debug, Clone)]
pub struct Overview {
    /// Account display name, falling back to the login.
    pub display_name: String,
    /// Accepted repository keys.
    pub repos: BTreeSet<String>,
    /// Accepted repositories with zero content, skipped by per-repo passes.
    pub empty_repos: HashSet<String>,
    /// Stargazer total across accepted repositories.
    pub stargazers: u64,
    /// Fork total across accepted repositories.
    pub forks: u64,
    /// Aggregated language map with final proportions.
    pub languages: BTreeMap<String, LanguageStat>,
    /// Languages observed but configured out of the map.
    pub excluded_languages: BTreeSet<String>
}

impl Overview {
    /// Iterates accepted repositories that have content, in sorted order.
    pub fn non_empty_repos(&self) -> impl Iterator<Item = &String> {
        self.repos.iter().filter(|name| !self.empty_repos.contains(*name))
    }
}

struct DiscoveryState<'a> {
    config:       &'a EngineConfig,
    repos:        BTreeSet<String>,
    empty_repos:  HashSet<String>,
    stargazers:   u64,
    forks:        u64,
    languages:    LanguageAccumulator,
    display_name: Option<String>
}

impl<'a> DiscoveryState<'a> {
    fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            repos: BTreeSet::new(),
            empty_repos: HashSet::new(),
            stargazers: 0,
            forks: 0,
            languages: LanguageAccumulator::default(),
            display_name: None
        }
    }

    /// Runs both filter predicates and folds an accepted record into the
    /// running totals. Star/fork totals include empty repositories; the
    /// language map does not.
    fn accept(&mut self, record: RepoRecord) {
        if is_name_invalid(&record.name, &self.repos, self.config) {
            debug!("skipping {} by name filter", record.name);
            return;
        }
        if is_type_excluded(&record, self.config) {
            debug!("skipping {} by type filter", record.name);
            return;
        }

        self.stargazers += record.stargazers;
        self.forks += record.forks;

        if record.is_empty {
            self.repos.insert(record.name.clone());
            self.empty_repos.insert(record.name);
            return;
        }

        for edge in &record.language_edges {
            self.languages.merge(
                &edge.name,
                edge.size,
                edge.color.as_deref(),
                &self.config.exclude_langs
            );
        }

        self.repos.insert(record.name);
    }

    fn capture_display_name(&mut self, viewer: &Value) {
        if self.display_name.is_some() {
            return;
        }
        let name = viewer
            .get("name")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .or_else(|| viewer.get("login").and_then(Value::as_str))
            .unwrap_or(NO_NAME);
        self.display_name = Some(name.to_string());
    }

    fn finish(self) -> Overview {
        let (languages, excluded_languages) = self.languages.finalize();
        Overview {
            display_name: self.display_name.unwrap_or_else(|| NO_NAME.to_string()),
            repos: self.repos,
            empty_repos: self.empty_repos,
            stargazers: self.stargazers,
            forks: self.forks,
            languages,
            excluded_languages
        }
    }
}

/// Discovers the complete repository set and its incremental aggregates.
///
/// Both graph connections are paginated in lock-step: each request carries
/// the latest cursor of either side (stale for a finished connection) and the
/// loop exits only when neither side reports a next page. Manually added
/// repositories are merged afterwards via REST.
///
/// # Errors
///
/// Propagates transport failures from the query client; they are fatal for
/// the run.
pub async fn collect_overview<Q>(client: &Q, config: &EngineConfig) -> Result<Overview, Error>
where
    Q: QueryClient
{
    let mut state = DiscoveryState::new(config);
    let mut owned_cursor: Option<String> = None;
    let mut contrib_cursor: Option<String> = None;

    loop {
        let document = client
            .query(&queries::repos_overview(owned_cursor.as_deref(), contrib_cursor.as_deref()))
            .await?;

        let viewer = document.pointer("/data/viewer").cloned().unwrap_or(Value::Null);
        state.capture_display_name(&viewer);

        let owned = viewer.get("repositories").cloned().unwrap_or(Value::Null);
        let contributed = viewer.get("repositoriesContributedTo").cloned().unwrap_or(Value::Null);

        accept_connection_nodes(&mut state, &owned);
        if !config.exclude_contrib_repos {
            accept_connection_nodes(&mut state, &contributed);
        }

        let owned_has_next = has_next_page(&owned);
        let contrib_has_next = has_next_page(&contributed);

        if !owned_has_next && !contrib_has_next {
            break;
        }

        if let Some(cursor) = end_cursor(&owned) {
            owned_cursor = Some(cursor);
        }
        if let Some(cursor) = end_cursor(&contributed) {
            contrib_cursor = Some(cursor);
        }
    }

    merge_manual_repos(client, config, &mut state).await?;

    info!(
        "discovered {} repositories ({} empty)",
        state.repos.len(),
        state.empty_repos.len()
    );

    Ok(state.finish())
}

fn accept_connection_nodes(state: &mut DiscoveryState<'_>, connection: &Value) {
    let Some(nodes) = connection.get("nodes").and_then(Value::as_array) else {
        return;
    };

    for node in nodes {
        if let Some(record) = RepoRecord::from_graph_node(node) {
            state.accept(record);
        }
    }
}

fn has_next_page(connection: &Value) -> bool {
    connection
        .pointer("/pageInfo/hasNextPage")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn end_cursor(connection: &Value) -> Option<String> {
    connection
        .pointer("/pageInfo/endCursor")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Fetches manually added repositories individually and folds them in, using
/// the flat REST language map and the external color table.
async fn merge_manual_repos<Q>(
    client: &Q,
    config: &EngineConfig,
    state: &mut DiscoveryState<'_>
) -> Result<(), Error>
where
    Q: QueryClient
{
    let mut colors: Option<HashMap<String, LanguageColor>> = None;

    for name in &config.manually_added_repos {
        if is_name_invalid(name, &state.repos, config) {
            debug!("skipping manual repo {} by name filter", name);
            continue;
        }

        let document = client.query_rest(&format!("/repos/{name}")).await?;
        let record = RepoRecord::from_rest(name, &document);

        if is_type_excluded(&record, config) {
            debug!("skipping manual repo {} by type filter", name);
            continue;
        }

        state.stargazers += record.stargazers;
        state.forks += record.forks;
        state.repos.insert(name.clone());

        if record.is_empty {
            state.empty_repos.insert(name.clone());
            continue;
        }

        if document.get("language").and_then(Value::as_str).is_none() {
            continue;
        }

        if colors.is_none() {
            colors = Some(client.language_colors().await?);
        }
        let Some(color_table) = colors.as_ref() else {
            continue;
        };

        let listing = client.query_rest(&format!("/repos/{name}/languages")).await?;
        if let Some(sizes) = listing.as_object() {
            for (language, size) in sizes {
                let color = color_table
                    .get(language)
                    .and_then(|entry| entry.color.as_deref());
                state.languages.merge(
                    language,
                    size.as_u64().unwrap_or(0),
                    color,
                    &config.exclude_langs
                );
            }
        }
    }

    Ok(())
}
