// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Pull-request and issue involvement counting.
//!
//! Items are deduplicated by URL across repositories. A non-object item in a
//! listing is the service's rate-limit envelope; it sets a sticky flag shared
//! between both metrics and aborts all further repository iteration for the
//! rest of the run, leaving the persisted count as the floor.

use std::{
    collections::HashSet,
    sync::atomic::{AtomicBool, Ordering}
};

use serde_json::Value;
use tracing::{info, warn};

use crate::{client::QueryClient, discovery::Overview, error::Error};

/// Which involvement listing to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Involvement {
    /// Pull requests the account created, reviewed or was assigned to.
    PullRequests,
    /// Issues the account created, reacted to or was assigned to.
    Issues
}

impl Involvement {
    fn path(self, repo: &str, username: &str) -> String {
        let segment = match self {
            Self::PullRequests => "pulls",
            Self::Issues => "issues"
        };
        format!("/repos/{repo}/{segment}?state=all&involved={username}")
    }

    fn label(self) -> &'static str {
        match self {
            Self::PullRequests => "pull requests",
            Self::Issues => "issues"
        }
    }
}

/// Counts distinct involvement URLs across accepted non-empty repositories.
///
/// When `rate_limited` is already set, no fetching happens and zero is
/// returned; the caller falls back to the persisted count via its
/// `max(fresh, persisted)` rule.
///
/// # Errors
///
/// Propagates transport failures from the query client.
pub async fn count_involvement<Q>(
    client: &Q,
    overview: &Overview,
    username: &str,
    kind: Involvement,
    rate_limited: &AtomicBool
) -> Result<u64, Error>
where
    Q: QueryClient
{
    let mut urls: HashSet<String> = HashSet::new();

    if !rate_limited.load(Ordering::SeqCst) {
        'repos: for repo in overview.non_empty_repos() {
            let items = client.query_paginated(&kind.path(repo, username)).await?;

            for item in &items {
                let Some(record) = item.as_object() else {
                    warn!(
                        "rate limit envelope while fetching {} for {}, aborting metric",
                        kind.label(),
                        repo
                    );
                    rate_limited.store(true, Ordering::SeqCst);
                    break 'repos;
                };

                if let Some(url) = record.get("url").and_then(Value::as_str) {
                    urls.insert(url.to_string());
                }
            }
        }
    } else {
        info!("skipping {} fetch, rate limit already hit this run", kind.label());
    }

    Ok(urls.len() as u64)
}
