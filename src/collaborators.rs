// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Collaborator survey across accepted repositories.
//!
//! Collects the global collaborator login set and marks a repository as
//! collaborative once more than one distinct collaborator is listed for it.
//! Malformed entries are skipped locally; a repository without a readable
//! listing simply contributes nothing.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::{client::QueryClient, discovery::Overview, error::Error};

/// Outcome of the collaborator pass.
#[derive(Debug, Clone, Default)]
pub struct CollaboratorSurvey {
    /// Distinct collaborator logins across all repositories, account owner
    /// included.
    pub collaborators: HashSet<String>,
    /// Repositories with more than one distinct collaborator.
    pub collab_repos: HashSet<String>
}

/// Fetches each accepted non-empty repository's collaborator listing.
///
/// # Errors
///
/// Propagates transport failures from the query client.
pub async fn survey_collaborators<Q>(
    client: &Q,
    overview: &Overview
) -> Result<CollaboratorSurvey, Error>
where
    Q: QueryClient
{
    let mut survey = CollaboratorSurvey::default();

    for repo in overview.non_empty_repos() {
        let entries = client
            .query_paginated(&format!("/repos/{repo}/collaborators"))
            .await?;

        let mut repo_logins: HashSet<&str> = HashSet::new();
        for entry in &entries {
            let Some(login) = entry.get("login").and_then(Value::as_str) else {
                debug!("skipping malformed collaborator entry for {}", repo);
                continue;
            };

            repo_logins.insert(login);
            survey.collaborators.insert(login.to_string());
        }

        if repo_logins.len() > 1 {
            survey.collab_repos.insert(repo.clone());
        }
    }

    Ok(survey)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use serde_json::json;

    use super::*;
    use crate::testutil::FakeClient;

    fn overview_for(repos: &[&str], empty: &[&str]) -> Overview {
        Overview {
            display_name: "The Octocat".to_string(),
            repos: repos.iter().map(|name| name.to_string()).collect::<BTreeSet<String>>(),
            empty_repos: empty.iter().map(|name| name.to_string()).collect(),
            stargazers: 0,
            forks: 0,
            languages: Default::default(),
            excluded_languages: Default::default()
        }
    }

    #[tokio::test]
    async fn single_collaborator_does_not_mark_collab_repo() {
        let mut client = FakeClient::default();
        client.paginated.insert(
            "/repos/octocat/solo/collaborators".to_string(),
            vec![json!({ "login": "octocat" })]
        );

        let survey = survey_collaborators(&client, &overview_for(&["octocat/solo"], &[]))
            .await
            .expect("survey failed");

        assert_eq!(survey.collaborators.len(), 1);
        assert!(survey.collab_repos.is_empty(), "threshold is strictly more than one");
    }

    #[tokio::test]
    async fn multiple_collaborators_mark_collab_repo() {
        let mut client = FakeClient::default();
        client.paginated.insert(
            "/repos/octocat/shared/collaborators".to_string(),
            vec![
                json!({ "login": "octocat" }),
                json!({ "login": "friend" }),
                json!({ "login": "rival" })
            ]
        );

        let survey = survey_collaborators(&client, &overview_for(&["octocat/shared"], &[]))
            .await
            .expect("survey failed");

        assert_eq!(survey.collaborators.len(), 3);
        assert!(survey.collab_repos.contains("octocat/shared"));
    }

    #[tokio::test]
    async fn duplicated_login_counts_as_one_collaborator() {
        let mut client = FakeClient::default();
        client.paginated.insert(
            "/repos/octocat/echo/collaborators".to_string(),
            vec![
                json!({ "login": "octocat" }),
                json!({ "login": "octocat" }),
                json!({ "login": "octocat" })
            ]
        );

        let survey = survey_collaborators(&client, &overview_for(&["octocat/echo"], &[]))
            .await
            .expect("survey failed");

        assert_eq!(survey.collaborators.len(), 1);
        assert!(
            survey.collab_repos.is_empty(),
            "repeated listing entries for one login are not collaboration"
        );
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped_locally() {
        let mut client = FakeClient::default();
        client.paginated.insert(
            "/repos/octocat/odd/collaborators".to_string(),
            vec![
                json!("rate limit notice"),
                json!({ "id": 42 }),
                json!({ "login": "octocat" })
            ]
        );

        let survey = survey_collaborators(&client, &overview_for(&["octocat/odd"], &[]))
            .await
            .expect("survey failed");

        assert_eq!(survey.collaborators.len(), 1);
        assert!(survey.collab_repos.is_empty());
    }

    #[tokio::test]
    async fn empty_repositories_are_not_fetched() {
        let client = FakeClient::default();
        let overview = overview_for(&["octocat/empty"], &["octocat/empty"]);

        let survey = survey_collaborators(&client, &overview).await.expect("survey failed");

        assert!(survey.collaborators.is_empty());
        assert_eq!(client.rest_call_count(), 0);
    }
}
