// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./todosync.toml` > `~/.config/todosync/todosync.toml` >
//! `/etc/todosync/todosync.toml` with environment variable overrides via `TODOSYNC_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TodosyncConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/todosync/todosync.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "todosync.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/todosync/todosync.toml` (system-wide)
/// 3. `~/.config/todosync/todosync.toml` (user XDG config)
/// 4. `./todosync.toml` (local directory)
/// 5. `TODOSYNC_*` environment variables
pub fn load_config() -> Result<TodosyncConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TodosyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TodosyncConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TodosyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TodosyncConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TodosyncConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("todosync").join(LOCAL_CONFIG_FILE))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment variable provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `TODOSYNC_REMOTE_ANON_KEY` must become `remote.anon_key`,
/// not `remote.anon.key`.
fn env_provider() -> Env {
    Env::prefixed("TODOSYNC_").map(|key| {
        // `key` is lowercased with the prefix stripped, e.g. "remote_anon_key".
        let key = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
                return format!("{section}.{rest}").into();
            }
        }
        key.to_string().into()
    })
}

/// Top-level sections addressable from the environment.
const SECTIONS: [&str; 5] = ["remote", "query", "session", "sync", "log"];
