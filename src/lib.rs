// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! GitHub usage-statistics aggregation engine.
//!
//! The crate discovers an account's repositories over the GraphQL API,
//! aggregates language, contribution, authorship, collaborator, view and
//! involvement metrics across them, and reconciles the results against a
//! file-backed store of persisted counters. Every metric family is resolved
//! lazily and memoized, so concurrent consumers of a [`StatsEngine`] share one
//! fetch sequence per family.

mod activity;
mod authorship;
mod backoff;
mod client;
mod collaborators;
mod config;
mod contributions;
mod discovery;
mod engine;
mod error;
mod languages;
mod queries;
mod store;
mod views;

#[cfg(test)]
mod testutil;

pub use backoff::{BackoffPolicy, with_backoff};
pub use client::{GithubClient, LanguageColor, QueryClient};
pub use config::{
    EngineConfig, parse_csv_ordered, parse_csv_set, parse_flag, parse_opt_out_flag,
    validate_date
};
pub use discovery::{Overview, RepoRecord, is_name_invalid, is_type_excluded};
pub use engine::{StatsEngine, Summary};
pub use error::Error;
pub use languages::{LanguageAccumulator, LanguageStat};
pub use store::{DATE_SENTINEL, StatsStore};
