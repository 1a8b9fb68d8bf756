// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the todosync client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use todosync_core::SortOrder;

/// Top-level todosync configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TodosyncConfig {
    /// Hosted auth + table service.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Search, filter and pagination behavior.
    #[serde(default)]
    pub query: QueryConfig,

    /// Session persistence.
    #[serde(default)]
    pub session: SessionConfig,

    /// Local reconciliation after mutations.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// Remote service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    #[serde(default = "default_remote_url")]
    pub url: String,

    /// Public (anon) API key sent as `apikey`. `None` requires the env var.
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Table holding the todo records.
    #[serde(default = "default_table")]
    pub table: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_remote_url(),
            anon_key: None,
            table: default_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_remote_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_table() -> String {
    "todos".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Query parameter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Records per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period before search text takes effect.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Result ordering column (`created_at` or `id`).
    #[serde(default)]
    pub order: SortOrder,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            order: SortOrder::default(),
        }
    }
}

impl QueryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_page_size() -> usize {
    10
}

fn default_debounce_ms() -> u64 {
    400
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Persist the session across process restarts.
    #[serde(default = "default_persist")]
    pub persist: bool,

    /// Session file location. Defaults to `$XDG_DATA_HOME/todosync/session.json`.
    #[serde(default)]
    pub path: Option<String>,

    /// Refresh a session this many seconds before it expires.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persist: default_persist(),
            path: None,
            refresh_margin_secs: default_refresh_margin_secs(),
        }
    }
}

impl SessionConfig {
    /// Resolved session file path, if persistence is enabled.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if !self.persist {
            return None;
        }
        match &self.path {
            Some(path) => Some(PathBuf::from(path)),
            None => dirs::data_dir().map(|d| d.join("todosync").join("session.json")),
        }
    }
}

fn default_persist() -> bool {
    true
}

fn default_refresh_margin_secs() -> u64 {
    60
}

/// How local state catches up with a successful mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Patch the local page in place (prepend, remove, edit).
    #[default]
    Patch,
    /// Re-run the current query.
    Refetch,
}

/// Reconciliation configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    #[serde(default)]
    pub reconcile: ReconcileMode,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
