// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end controller testing.
//!
//! `TestHarness` assembles a [`TodoController`] over [`MockAuth`] and
//! [`InMemoryTodoStore`], with registered accounts and seeded rows, and
//! signs a user in on request.

use std::sync::Arc;
use std::time::Duration;

use todosync_config::ReconcileMode;
use todosync_controller::{ControllerOptions, SessionManager, TodoController};
use todosync_core::{Credentials, Session, SortOrder, TodoError};

use crate::memory_store::InMemoryTodoStore;
use crate::mock_auth::MockAuth;

/// Password of every account registered through the builder.
pub const TEST_PASSWORD: &str = "correct-horse";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    options: ControllerOptions,
    accounts: Vec<String>,
    rows: Vec<(String, String, bool)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            options: ControllerOptions::default(),
            accounts: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.options.page_size = page_size;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.options.debounce = debounce;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.options.order = order;
        self
    }

    pub fn with_reconcile(mut self, reconcile: ReconcileMode) -> Self {
        self.options.reconcile = reconcile;
        self
    }

    /// Registers `email` with [`TEST_PASSWORD`].
    pub fn with_account(mut self, email: &str) -> Self {
        self.accounts.push(email.to_string());
        self
    }

    /// Seeds a row owned by the account `email`. Rows are seeded in order,
    /// so later rows are newer.
    pub fn with_todo(mut self, email: &str, text: &str, completed: bool) -> Self {
        self.rows
            .push((email.to_string(), text.to_string(), completed));
        self
    }

    /// Builds the harness and resolves the (empty) persisted session.
    pub async fn build(self) -> Result<TestHarness, TodoError> {
        let auth = Arc::new(MockAuth::new());
        for email in &self.accounts {
            auth.register(email, TEST_PASSWORD);
        }

        let store = Arc::new(InMemoryTodoStore::new());
        for (email, text, completed) in &self.rows {
            let owner = auth
                .user_id(email)
                .ok_or_else(|| TodoError::Internal(format!("no account for {email}")))?;
            store.seed(&owner.0, text, *completed);
        }

        let sessions = Arc::new(SessionManager::new(auth.clone()));
        let controller = Arc::new(TodoController::new(
            sessions.clone(),
            store.clone(),
            self.options,
        ));
        controller.start().await?;

        Ok(TestHarness {
            auth,
            store,
            sessions,
            controller,
        })
    }
}

/// A controller wired to in-memory adapters.
pub struct TestHarness {
    pub auth: Arc<MockAuth>,
    pub store: Arc<InMemoryTodoStore>,
    pub sessions: Arc<SessionManager>,
    pub controller: Arc<TodoController>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Signs `email` in with [`TEST_PASSWORD`] through the controller.
    pub async fn sign_in(&self, email: &str) -> Result<Session, TodoError> {
        self.controller
            .sign_in(&Credentials::new(email, TEST_PASSWORD))
            .await
    }
}
