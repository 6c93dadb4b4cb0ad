// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Cumulative view tracking over the service's rolling 14-day window.
//!
//! Daily entries dated after the persisted last-viewed date are folded into
//! the persisted counter as they are seen; today's entries are held in a
//! separate same-day accumulator because the day is still accruing and must
//! not be persisted as final. Counter increments land before the window dates
//! advance, so an interrupted run can only undercount, never corrupt.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    client::QueryClient,
    discovery::Overview,
    error::Error,
    store::{DATE_SENTINEL, StatsStore}
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Resolved view metrics for this run.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewStats {
    /// Persisted total plus today's same-day views.
    pub total: u64,
    /// First date included in the count.
    pub from_date: String
}

/// Reconciles per-repository traffic windows against the persisted counters.
///
/// With persistence enabled the last-viewed date advances to yesterday and a
/// never-set first-viewed date is fixed to the earliest date observed this
/// run. `today` is injected so the same-day holdout is testable.
///
/// # Errors
///
/// Propagates transport failures and store write failures.
pub async fn reconcile_views<Q>(
    client: &Q,
    overview: &Overview,
    store: &Mutex<StatsStore>,
    persist: bool,
    today: NaiveDate
) -> Result<ViewStats, Error>
where
    Q: QueryClient
{
    let today_str = today.format(DATE_FORMAT).to_string();
    let yesterday_str = today
        .pred_opt()
        .unwrap_or(today)
        .format(DATE_FORMAT)
        .to_string();

    let last_viewed = store.lock().await.views_to_date().to_string();

    let mut observed: BTreeSet<String> = BTreeSet::new();
    observed.insert(yesterday_str.clone());
    if last_viewed != DATE_SENTINEL {
        observed.insert(last_viewed.clone());
    }

    let mut today_count = 0u64;

    for repo in overview.non_empty_repos() {
        let document = client.query_rest(&format!("/repos/{repo}/traffic/views")).await?;
        let Some(entries) = document.get("views").and_then(Value::as_array) else {
            debug!("no traffic window for {}", repo);
            continue;
        };

        for entry in entries {
            let Some(date) = entry
                .get("timestamp")
                .and_then(Value::as_str)
                .and_then(|timestamp| timestamp.get(..10))
            else {
                continue;
            };
            let count = entry.get("count").and_then(Value::as_u64).unwrap_or(0);

            if date == today_str {
                today_count += count;
            } else if date > last_viewed.as_str() {
                store.lock().await.add_views(count)?;
                observed.insert(date.to_string());
            }
        }
    }

    let mut guard = store.lock().await;

    let from_date = if persist {
        guard.set_views_to_date(&yesterday_str)?;

        if guard.views_from_date() == DATE_SENTINEL {
            let earliest = observed
                .first()
                .cloned()
                .unwrap_or_else(|| yesterday_str.clone());
            guard.set_views_from_date(&earliest)?;
        }

        guard.views_from_date().to_string()
    } else {
        observed
            .first()
            .cloned()
            .unwrap_or_else(|| yesterday_str.clone())
    };

    Ok(ViewStats {
        total: guard.views() + today_count,
        from_date
    })
}
