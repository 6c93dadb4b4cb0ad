// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! All-time contribution total.
//!
//! Two sequential graph queries: list the calendar years with contribution
//! history, then request every year's contribution calendar in one combined
//! document and sum the totals. Bounded by the account's age, so no
//! pagination applies.

use serde_json::Value;
use tracing::debug;

use crate::{client::QueryClient, error::Error, queries};

/// Sums `totalContributions` across every calendar year of the account.
///
/// # Errors
///
/// Propagates transport failures from the query client.
pub async fn total_contributions<Q>(client: &Q) -> Result<u64, Error>
where
    Q: QueryClient
{
    let document = client.query(&queries::contribution_years()).await?;

    let years: Vec<i64> = document
        .pointer("/data/viewer/contributionsCollection/contributionYears")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();

    if years.is_empty() {
        debug!("no contribution years reported");
        return Ok(0);
    }

    let document = client.query(&queries::contributions_for_years(&years)).await?;

    let total = document
        .pointer("/data/viewer")
        .and_then(Value::as_object)
        .map(|viewer| {
            viewer
                .values()
                .filter_map(|year| {
                    year.pointer("/contributionCalendar/totalContributions")
                        .and_then(Value::as_u64)
                })
                .sum()
        })
        .unwrap_or(0);

    Ok(total)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testutil::FakeClient;

    #[tokio::test]
    async fn sums_all_years() {
        let mut client = FakeClient::default();
        client.years_response = json!({
            "data": { "viewer": { "contributionsCollection": {
                "contributionYears": [2023, 2024]
            }}}
        });
        client.calendar_response = json!({
            "data": { "viewer": {
                "year2023": { "contributionCalendar": { "totalContributions": 120 } },
                "year2024": { "contributionCalendar": { "totalContributions": 80 } }
            }}
        });

        let total = total_contributions(&client).await.expect("fetch failed");
        assert_eq!(total, 200);
    }

    #[tokio::test]
    async fn empty_year_list_short_circuits_to_zero() {
        let mut client = FakeClient::default();
        client.years_response = json!({
            "data": { "viewer": { "contributionsCollection": { "contributionYears": [] } } }
        });

        let total = total_contributions(&client).await.expect("fetch failed");
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn malformed_calendar_entries_are_ignored() {
        let mut client = FakeClient::default();
        client.years_response = json!({
            "data": { "viewer": { "contributionsCollection": { "contributionYears": [2024] } } }
        });
        client.calendar_response = json!({
            "data": { "viewer": {
                "year2024": { "contributionCalendar": {} },
                "stray": "not a calendar"
            }}
        });

        let total = total_contributions(&client).await.expect("fetch failed");
        assert_eq!(total, 0);
    }
}
