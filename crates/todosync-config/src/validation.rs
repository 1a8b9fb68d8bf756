// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: URL scheme,
//! page size bounds, debounce ceiling, known log levels.

use crate::diagnostic::ConfigError;
use crate::model::TodosyncConfig;

/// Largest page a single request may ask for.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Longest accepted search debounce.
pub const MAX_DEBOUNCE_MS: u64 = 10_000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &TodosyncConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let url = config.remote.url.trim();
    if url.is_empty() {
        fail("remote.url must not be empty".to_string());
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        fail(format!("remote.url `{url}` must start with http:// or https://"));
    }

    if config.remote.table.trim().is_empty() {
        fail("remote.table must not be empty".to_string());
    }

    if config.remote.timeout_secs == 0 {
        fail("remote.timeout_secs must be at least 1".to_string());
    }

    if config.query.page_size == 0 || config.query.page_size > MAX_PAGE_SIZE {
        fail(format!(
            "query.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
            config.query.page_size
        ));
    }

    if config.query.debounce_ms > MAX_DEBOUNCE_MS {
        fail(format!(
            "query.debounce_ms must be at most {MAX_DEBOUNCE_MS}, got {}",
            config.query.debounce_ms
        ));
    }

    if config
        .session
        .path
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        fail("session.path must not be empty when set".to_string());
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &TodosyncConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&TodosyncConfig::default()).is_ok());
    }

    #[test]
    fn url_without_scheme_fails() {
        let mut config = TodosyncConfig::default();
        config.remote.url = "xyz.supabase.co".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("remote.url")));
    }

    #[test]
    fn zero_page_size_fails() {
        let mut config = TodosyncConfig::default();
        config.query.page_size = 0;
        assert!(messages(&config).iter().any(|m| m.contains("page_size")));
    }

    #[test]
    fn unknown_log_level_fails() {
        let mut config = TodosyncConfig::default();
        config.log.level = "loud".to_string();
        assert!(messages(&config).iter().any(|m| m.contains("log.level")));
    }

    #[test]
    fn all_failures_are_collected() {
        let mut config = TodosyncConfig::default();
        config.remote.url = String::new();
        config.remote.table = " ".to_string();
        config.query.debounce_ms = MAX_DEBOUNCE_MS + 1;
        assert_eq!(messages(&config).len(), 3);
    }

    #[test]
    fn upper_case_log_level_is_accepted() {
        let mut config = TodosyncConfig::default();
        config.log.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
