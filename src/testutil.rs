// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! In-memory [`QueryClient`] used by unit tests.
//!
//! Graph documents are dispatched on their content: contribution-year and
//! calendar queries return fixed responses, while repository-overview queries
//! consume a queue of pages so pagination can be scripted. REST lookups and
//! listings are keyed by exact path. Call counters expose how many fetch
//! sequences actually ran, which the single-flight tests assert on.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering}
    }
};

use serde_json::{Value, json};

use crate::{
    client::{LanguageColor, QueryClient},
    error::Error
};

#[derive(Default)]
pub struct FakeClient {
    pub overview_pages: Mutex<VecDeque<Value>>,
    pub years_response: Value,
    pub calendar_response: Value,
    pub rest: HashMap<String, Value>,
    pub paginated: HashMap<String, Vec<Value>>,
    pub colors: HashMap<String, LanguageColor>,
    pub overview_calls: AtomicUsize,
    pub rest_calls: AtomicUsize
}

impl FakeClient {
    /// Queues one repository-overview page.
    pub fn push_overview_page(&mut self, page: Value) {
        self.overview_pages.get_mut().expect("pages lock poisoned").push_back(page);
    }

    /// Queues a single-page overview response with the given owned nodes and
    /// no further pages on either connection.
    pub fn with_single_overview_page(mut self, nodes: Vec<Value>) -> Self {
        self.push_overview_page(json!({
            "data": { "viewer": {
                "login": "octocat",
                "name": "The Octocat",
                "repositories": {
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "nodes": nodes
                },
                "repositoriesContributedTo": {
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "nodes": []
                }
            }}
        }));
        self
    }

    pub fn overview_call_count(&self) -> usize {
        self.overview_calls.load(Ordering::SeqCst)
    }

    pub fn rest_call_count(&self) -> usize {
        self.rest_calls.load(Ordering::SeqCst)
    }
}

impl QueryClient for FakeClient {
    async fn query(&self, document: &str) -> Result<Value, Error> {
        if document.contains("contributionYears") {
            return Ok(self.years_response.clone());
        }
        if document.contains("contributionCalendar") {
            return Ok(self.calendar_response.clone());
        }

        self.overview_calls.fetch_add(1, Ordering::SeqCst);
        let page = self
            .overview_pages
            .lock()
            .expect("pages lock poisoned")
            .pop_front()
            .expect("unexpected overview query: page queue exhausted");
        Ok(page)
    }

    async fn query_rest(&self, path: &str) -> Result<Value, Error> {
        self.rest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rest.get(path).cloned().unwrap_or_else(|| json!({})))
    }

    async fn query_paginated(&self, path: &str) -> Result<Vec<Value>, Error> {
        self.rest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.paginated.get(path).cloned().unwrap_or_default())
    }

    async fn language_colors(&self) -> Result<HashMap<String, LanguageColor>, Error> {
        Ok(self.colors.clone())
    }
}
