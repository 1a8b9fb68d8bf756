// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the todosync configuration system.

use figment::Jail;
use todosync_config::diagnostic::ConfigError;
use todosync_config::model::TodosyncConfig;
use todosync_config::{ReconcileMode, load_and_validate_str, load_config, load_config_from_str};
use todosync_core::SortOrder;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[remote]
url = "https://abc.supabase.co"
anon_key = "anon-123"
table = "tasks"
timeout_secs = 5

[query]
page_size = 25
debounce_ms = 250
order = "id"

[session]
persist = false
refresh_margin_secs = 30

[sync]
reconcile = "refetch"

[log]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.remote.url, "https://abc.supabase.co");
    assert_eq!(config.remote.anon_key.as_deref(), Some("anon-123"));
    assert_eq!(config.remote.table, "tasks");
    assert_eq!(config.remote.timeout_secs, 5);
    assert_eq!(config.query.page_size, 25);
    assert_eq!(config.query.debounce_ms, 250);
    assert_eq!(config.query.order, SortOrder::IdDesc);
    assert!(!config.session.persist);
    assert!(config.session.resolved_path().is_none());
    assert_eq!(config.session.refresh_margin_secs, 30);
    assert_eq!(config.sync.reconcile, ReconcileMode::Refetch);
    assert_eq!(config.log.level, "debug");
}

/// An empty file yields the compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.remote.table, "todos");
    assert!(config.remote.anon_key.is_none());
    assert_eq!(config.query.page_size, 10);
    assert_eq!(config.query.debounce_ms, 400);
    assert_eq!(config.query.order, SortOrder::CreatedAtDesc);
    assert!(config.session.persist);
    assert_eq!(config.sync.reconcile, ReconcileMode::Patch);
    assert_eq!(config.log.level, "info");
}

#[test]
fn unknown_field_in_query_is_rejected() {
    let err = load_config_from_str("[query]\npage_szie = 3\n").expect_err("should reject");
    let msg = err.to_string();
    assert!(
        msg.contains("unknown field") || msg.contains("page_szie"),
        "unexpected error: {msg}"
    );
}

#[test]
fn unknown_top_level_section_is_rejected() {
    assert!(load_config_from_str("[logging]\nlevel = \"debug\"\n").is_err());
}

#[test]
fn unknown_key_diagnostic_carries_suggestion() {
    let errors = load_and_validate_str("[remote]\nanon_kye = \"x\"\n").unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { suggestion: Some(s), .. } if s == "anon_key"
    )));
}

#[test]
fn invalid_reconcile_mode_is_rejected() {
    assert!(load_config_from_str("[sync]\nreconcile = \"sometimes\"\n").is_err());
}

#[test]
fn validation_runs_after_parsing() {
    let errors = load_and_validate_str("[query]\npage_size = 0\n").unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("page_size"))));
}

/// `TODOSYNC_REMOTE_ANON_KEY` maps to `remote.anon_key`, not `remote.anon.key`.
#[test]
fn env_vars_override_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "todosync.toml",
            r#"
[remote]
url = "https://from-file.supabase.co"

[query]
page_size = 5
"#,
        )?;
        jail.set_env("TODOSYNC_REMOTE_ANON_KEY", "anon-from-env");
        jail.set_env("TODOSYNC_QUERY_DEBOUNCE_MS", "150");
        jail.set_env("TODOSYNC_SYNC_RECONCILE", "refetch");

        let config: TodosyncConfig = load_config()?;
        assert_eq!(config.remote.url, "https://from-file.supabase.co");
        assert_eq!(config.remote.anon_key.as_deref(), Some("anon-from-env"));
        assert_eq!(config.query.page_size, 5);
        assert_eq!(config.query.debounce_ms, 150);
        assert_eq!(config.sync.reconcile, ReconcileMode::Refetch);
        Ok(())
    });
}

#[test]
fn explicit_session_path_is_used() {
    let config = load_config_from_str("[session]\npath = \"/tmp/todosync-session.json\"\n").unwrap();
    assert_eq!(
        config.session.resolved_path(),
        Some(std::path::PathBuf::from("/tmp/todosync-session.json"))
    );
}
