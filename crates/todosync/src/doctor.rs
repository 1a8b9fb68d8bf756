// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `todosync doctor` command implementation.
//!
//! Runs diagnostic checks against the configured backend: adapter health,
//! and the state of the persisted session.

use std::time::{Duration, Instant};

use chrono::Utc;
use colored::Colorize;
use todosync_config::TodosyncConfig;
use todosync_core::{HealthStatus, PluginAdapter, TodoError};
use todosync_supabase::SessionFile;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

/// Runs every check and prints a report. Returns true if any check failed.
pub async fn run_doctor(config: &TodosyncConfig, color: bool) -> Result<bool, TodoError> {
    let mut results = Vec::new();

    let start = Instant::now();
    match todosync_supabase::connect(config) {
        Ok(connection) => {
            results.push(CheckResult {
                name: "remote config".into(),
                status: CheckStatus::Pass,
                message: config.remote.url.clone(),
                duration: start.elapsed(),
            });
            results.push(check_adapter(&connection.auth).await);
            results.push(check_adapter(&connection.store).await);
        }
        Err(e) => results.push(CheckResult {
            name: "remote config".into(),
            status: CheckStatus::Fail,
            message: e.to_string(),
            duration: start.elapsed(),
        }),
    }
    results.push(check_session_file(config).await);

    println!();
    println!("  todosync doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_result(result, color));
    }
    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
    }
    Ok(results.iter().any(|r| r.status == CheckStatus::Fail))
}

/// Maps an adapter health check onto a report line.
pub async fn check_adapter(adapter: &dyn PluginAdapter) -> CheckResult {
    let start = Instant::now();
    let (status, message) = match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (CheckStatus::Warn, reason),
        Ok(HealthStatus::Unhealthy(reason)) => (CheckStatus::Fail, reason),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult {
        name: adapter.name().to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}

async fn check_session_file(config: &TodosyncConfig) -> CheckResult {
    let start = Instant::now();
    let Some(path) = config.session.resolved_path() else {
        return CheckResult {
            name: "session".into(),
            status: CheckStatus::Pass,
            message: "persistence disabled".into(),
            duration: start.elapsed(),
        };
    };
    let (status, message) = match SessionFile::new(&path).load().await {
        Ok(None) => (CheckStatus::Pass, "no stored session".to_string()),
        Ok(Some(session)) if session.is_expired(Utc::now()) => (
            CheckStatus::Warn,
            format!("stored session for {} has expired", session.user_id),
        ),
        Ok(Some(session)) => (
            CheckStatus::Pass,
            format!("signed in as {}", session.email.as_deref().unwrap_or("unknown")),
        ),
        Err(e) => (CheckStatus::Fail, format!("{}: {e}", path.display())),
    };
    CheckResult {
        name: "session".into(),
        status,
        message,
        duration: start.elapsed(),
    }
}

fn format_result(result: &CheckResult, color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if !color {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        return format!(
            "    {tag} {:<16} {} ({duration_ms}ms)",
            result.name, result.message
        );
    }
    let (symbol, message) = match result.status {
        CheckStatus::Pass => ("✓".green(), result.message.normal()),
        CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
        CheckStatus::Fail => ("✗".red(), result.message.red()),
    };
    format!(
        "    {symbol} {:<16} {message} ({duration_ms}ms)",
        result.name
    )
}
