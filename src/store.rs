// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! File-backed persisted counters surviving across runs.
//!
//! The store holds the cumulative view counter with its date window plus the
//! last known-good pull-request and issue counts. Every setter writes the
//! whole document back to disk before returning, so an interrupted run never
//! observes half-applied state on the next start. Counter writes are ordered
//! by the callers: view increments land before the window dates advance.

use std::{
    fs,
    path::{Path, PathBuf}
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, store_io_error};

/// Sentinel for "never observed" view-window dates.
pub const DATE_SENTINEL: &str = "0000-00-00";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ViewWindow {
    count: u64,
    from:  String,
    to:    String
}

impl Default for ViewWindow {
    fn default() -> Self {
        Self {
            count: 0,
            from:  DATE_SENTINEL.to_string(),
            to:    DATE_SENTINEL.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedCounters {
    views:         ViewWindow,
    #[serde(default)]
    pull_requests: u64,
    #[serde(default)]
    issues:        u64
}

/// Persisted key-value store for view, pull-request and issue counters.
///
/// Counters are monotonically non-decreasing across runs: view counts only
/// ever receive increments, and the PR/issue setters are fed
/// `max(fresh, persisted)` by the engine.
#[derive(Debug)]
pub struct StatsStore {
    path: PathBuf,
    data: PersistedCounters
}

impl StatsStore {
    /// Opens the store at `path`, starting from zeroed counters when the file
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the file exists but cannot be read and
    /// [`Error::Serialize`] when its contents are not a valid counters
    /// document.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let data = match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!("counters store missing at {}, starting fresh", path.display());
                PersistedCounters::default()
            }
            Err(source) => return Err(store_io_error(path, source))
        };

        Ok(Self {
            path: path.to_path_buf(),
            data
        })
    }

    /// Cumulative view count.
    pub fn views(&self) -> u64 {
        self.data.views.count
    }

    /// First date included in the view counter, or the sentinel.
    pub fn views_from_date(&self) -> &str {
        &self.data.views.from
    }

    /// Last date folded into the view counter, or the sentinel.
    pub fn views_to_date(&self) -> &str {
        &self.data.views.to
    }

    /// Last known-good pull-request count.
    pub fn pull_requests(&self) -> u64 {
        self.data.pull_requests
    }

    /// Last known-good issue count.
    pub fn issues(&self) -> u64 {
        self.data.issues
    }

    /// Adds daily view counts into the cumulative counter and persists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the write-through fails.
    pub fn add_views(&mut self, count: u64) -> Result<(), Error> {
        self.data.views.count += count;
        self.write_through()
    }

    /// Replaces the cumulative view counter and persists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the write-through fails.
    pub fn set_views_count(&mut self, count: u64) -> Result<(), Error> {
        self.data.views.count = count;
        self.write_through()
    }

    /// Sets the first date covered by the view counter and persists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the write-through fails.
    pub fn set_views_from_date(&mut self, date: &str) -> Result<(), Error> {
        self.data.views.from = date.to_string();
        self.write_through()
    }

    /// Sets the last date covered by the view counter and persists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the write-through fails.
    pub fn set_views_to_date(&mut self, date: &str) -> Result<(), Error> {
        self.data.views.to = date.to_string();
        self.write_through()
    }

    /// Sets the pull-request counter and persists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the write-through fails.
    pub fn set_pull_requests(&mut self, count: u64) -> Result<(), Error> {
        self.data.pull_requests = count;
        self.write_through()
    }

    /// Sets the issue counter and persists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the write-through fails.
    pub fn set_issues(&mut self, count: u64) -> Result<(), Error> {
        self.data.issues = count;
        self.write_through()
    }

    fn write_through(&self) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, contents).map_err(|source| store_io_error(&self.path, source))
    }
}
