// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Query transport consumed by the stats engine.
///
/// The engine sees the remote service through three operations: a GraphQL
/// query, a single REST document lookup and an internally paginated REST
/// listing, plus the out-of-API language color table. Retry and backoff live
/// entirely on this side of the seam.
use std::collections::HashMap;

use masterror::AppError;
use octocrab::Octocrab;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    backoff::{BackoffPolicy, with_backoff},
    error::Error
};

const COLORS_URL: &str =
    "https://raw.githubusercontent.com/ozh/github-colors/master/colors.json";
const PER_PAGE: usize = 100;
const MAX_PAGES: u32 = 100;

/// Display color assigned to a language by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageColor {
    /// Hex color, absent for languages without an assigned color.
    pub color: Option<String>
}

/// Operations the stats engine issues against the remote service.
///
/// Responses are generic nested JSON documents; shape checks happen in the
/// aggregation passes so that a single malformed record never fails a whole
/// fetch.
#[allow(async_fn_in_trait)]
pub trait QueryClient {
    /// Runs a GraphQL document and returns the decoded response tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the call fails after retries.
    async fn query(&self, document: &str) -> Result<Value, Error>;

    /// Fetches a single REST document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the call fails after retries.
    async fn query_rest(&self, path: &str) -> Result<Value, Error>;

    /// Fetches a REST listing, following pagination internally and returning
    /// the flattened, ordered item sequence.
    ///
    /// A page that is not a JSON array (the service's error envelope, e.g.
    /// under rate limiting) terminates pagination and is surfaced as a single
    /// non-object item for the caller's shape checks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when a page fetch fails after retries.
    async fn query_paginated(&self, path: &str) -> Result<Vec<Value>, Error>;

    /// Fetches the language color table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the table cannot be retrieved.
    async fn language_colors(&self) -> Result<HashMap<String, LanguageColor>, Error>;
}

/// [`QueryClient`] implementation backed by an authenticated octocrab client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    octocrab: Octocrab,
    policy:   BackoffPolicy
}

impl GithubClient {
    /// Builds a client from a personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the underlying client cannot be
    /// constructed.
    pub fn new(token: &str) -> Result<Self, Error> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| Error::transport(format!("failed to initialize GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            policy: BackoffPolicy::default()
        })
    }

    async fn get_json(&self, path: &str, operation_name: &str) -> Result<Value, AppError> {
        let octocrab = self.octocrab.clone();
        let path_owned = path.to_string();

        with_backoff(&self.policy, operation_name, || {
            let octocrab = octocrab.clone();
            let path = path_owned.clone();
            async move {
                octocrab
                    .get(&path, None::<&()>)
                    .await
                    .map_err(|e| AppError::service(format!("GET {path} failed: {e}")))
            }
        })
        .await
    }
}

/// Appends page parameters to a REST path that may already carry a query
/// string.
fn paged_path(path: &str, page: u32) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}per_page={PER_PAGE}&page={page}")
}

impl QueryClient for GithubClient {
    async fn query(&self, document: &str) -> Result<Value, Error> {
        let octocrab = self.octocrab.clone();
        let payload = serde_json::json!({ "query": document });

        let value: Value = with_backoff(&self.policy, "graphql query", || {
            let octocrab = octocrab.clone();
            let payload = payload.clone();
            async move {
                octocrab
                    .graphql(&payload)
                    .await
                    .map_err(|e| AppError::service(format!("GraphQL query failed: {e}")))
            }
        })
        .await?;

        Ok(value)
    }

    async fn query_rest(&self, path: &str) -> Result<Value, Error> {
        debug!("REST lookup {}", path);
        Ok(self.get_json(path, "rest lookup").await?)
    }

    async fn query_paginated(&self, path: &str) -> Result<Vec<Value>, Error> {
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let document = self.get_json(&paged_path(path, page), "rest listing").await?;

            match document {
                Value::Array(page_items) => {
                    let fetched = page_items.len();
                    items.extend(page_items);
                    if fetched < PER_PAGE {
                        break;
                    }
                }
                other => {
                    warn!("non-list page for {}, stopping pagination", path);
                    items.push(other);
                    break;
                }
            }
        }

        Ok(items)
    }

    async fn language_colors(&self) -> Result<HashMap<String, LanguageColor>, Error> {
        let response = reqwest::get(COLORS_URL)
            .await
            .map_err(|e| Error::transport(format!("failed to fetch language colors: {e}")))?;

        response
            .json::<HashMap<String, LanguageColor>>()
            .await
            .map_err(|e| Error::transport(format!("failed to decode language colors: {e}")))
    }
}
