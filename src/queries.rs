// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! GraphQL document builders for the GitHub v4 API.
//!
//! Documents are assembled as plain strings: the engine treats responses as
//! generic nested JSON and never needs a schema-typed client. Cursor
//! parameters are embedded as `null` or a quoted opaque token.

/// Renders an optional pagination cursor as a GraphQL argument value.
fn cursor_argument(cursor: Option<&str>) -> String {
    match cursor {
        Some(token) => format!("\"{token}\""),
        None => "null".to_string()
    }
}

const REPO_CONNECTION_FIELDS: &str = r"
        pageInfo {
            hasNextPage
            endCursor
        }
        nodes {
            nameWithOwner
            stargazers {
                totalCount
            }
            forkCount
            isFork
            isEmpty
            isArchived
            isPrivate
            languages(first: 20, orderBy: { field: SIZE, direction: DESC }) {
                edges {
                    size
                    node {
                        name
                        color
                    }
                }
            }
        }";

/// Builds the repository-overview document paginating both the owned and the
/// contributed-to connections in lock-step.
///
/// Either cursor may belong to a connection that already reported its last
/// page; the server ignores a stale cursor for an exhausted connection.
pub fn repos_overview(owned_cursor: Option<&str>, contrib_cursor: Option<&str>) -> String {
    let owned = cursor_argument(owned_cursor);
    let contrib = cursor_argument(contrib_cursor);

    format!(
        r#"{{
    viewer {{
        login
        name
        repositories(
            first: 100,
            orderBy: {{ field: UPDATED_AT, direction: DESC }},
            after: {owned}) {{{REPO_CONNECTION_FIELDS}
        }}
        repositoriesContributedTo(
            first: 100,
            includeUserRepositories: false,
            orderBy: {{ field: UPDATED_AT, direction: DESC }},
            contributionTypes: [COMMIT, PULL_REQUEST, REPOSITORY, PULL_REQUEST_REVIEW],
            after: {contrib}) {{{REPO_CONNECTION_FIELDS}
        }}
    }}
}}"#
    )
}

/// Builds the document listing every calendar year with contribution history.
pub fn contribution_years() -> String {
    r"query {
    viewer {
        contributionsCollection {
            contributionYears
        }
    }
}"
    .to_string()
}

/// Builds one aliased `contributionsCollection` block for a calendar year.
fn contributions_for_year(year: i64) -> String {
    format!(
        r#"        year{year}: contributionsCollection(
            from: "{year}-01-01T00:00:00Z",
            to: "{next}-01-01T00:00:00Z") {{
            contributionCalendar {{
                totalContributions
            }}
        }}"#,
        next = year + 1
    )
}

/// Builds a single combined document requesting the contribution calendar for
/// every given year. Bounded by the account's age, so no pagination applies.
pub fn contributions_for_years(years: &[i64]) -> String {
    let by_year: Vec<String> = years.iter().map(|year| contributions_for_year(*year)).collect();

    format!(
        "query {{\n    viewer {{\n{}\n    }}\n}}",
        by_year.join("\n")
    )
}
