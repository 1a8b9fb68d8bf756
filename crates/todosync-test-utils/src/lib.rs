// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for todosync integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without a remote service.
//!
//! # Components
//!
//! - [`MockAuth`] - In-memory auth provider with failure injection
//! - [`InMemoryTodoStore`] - In-memory record store with held queries and failure injection
//! - [`TestHarness`] - A controller wired to both

pub mod harness;
pub mod memory_store;
pub mod mock_auth;

use chrono::{Duration, Utc};
use secrecy::SecretString;
use todosync_core::{Session, UserId};

pub use harness::{TEST_PASSWORD, TestHarness, TestHarnessBuilder};
pub use memory_store::{InMemoryTodoStore, InsertGate, QueryGate};
pub use mock_auth::MockAuth;

/// A session for `user` that is valid for an hour.
pub fn test_session(user: &str) -> Session {
    Session {
        user_id: UserId::from(user),
        email: Some(format!("{user}@example.com")),
        access_token: SecretString::from(format!("token-{user}")),
        refresh_token: None,
        expires_at: Some(Utc::now() + Duration::hours(1)),
    }
}
