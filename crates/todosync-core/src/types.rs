// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the controller and the adapters.

use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of an authenticated user, as assigned by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// Remote-assigned identifier of a todo record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub i64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated identity bound to a single user.
///
/// Tokens are kept behind [`SecretString`] so they never show up in `Debug`
/// output or logs.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub email: Option<String>,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Returns true once `now` has reached the expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Returns true if the session expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at.is_some_and(|at| now + margin >= at)
    }
}

/// Login material for sign-up and sign-in.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Where the client stands with respect to authentication.
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    /// A persisted session has not been resolved yet.
    #[default]
    Loading,
    /// No session.
    Unauthenticated,
    /// A session is active.
    Authenticated(Session),
}

impl AuthState {
    /// The active session, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// The user of the active session, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        self.session().map(|s| &s.user_id)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Loading => write!(f, "loading"),
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::Authenticated(s) => write!(f, "authenticated as {}", s.user_id),
        }
    }
}

/// A task record owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub user_id: UserId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating a record. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTodo {
    pub text: String,
    pub completed: bool,
    pub user_id: UserId,
}

/// Partial update applied to a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            text: None,
            completed: Some(completed),
        }
    }

    /// Applies the patch to a record in place.
    pub fn apply(&self, todo: &mut Todo) {
        if let Some(text) = &self.text {
            todo.text = text.clone();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

/// Owner-scoped predicate for update and delete. Both fields are always sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoMatch {
    pub id: TodoId,
    pub owner: UserId,
}

impl TodoMatch {
    pub fn matches(&self, todo: &Todo) -> bool {
        todo.id == self.id && todo.user_id == self.owner
    }
}

/// Completion filter selected in the view.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CompletionFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl CompletionFilter {
    /// The `completed` value to match on, or `None` for no completion filter.
    pub fn completed(self) -> Option<bool> {
        match self {
            CompletionFilter::All => None,
            CompletionFilter::Completed => Some(true),
            CompletionFilter::Pending => Some(false),
        }
    }
}

/// Result ordering. Both orders are newest-first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum SortOrder {
    /// `created_at` descending, identifier descending as tie-breaker.
    #[default]
    #[serde(rename = "created_at")]
    #[strum(serialize = "created_at")]
    CreatedAtDesc,
    /// Identifier descending, for stores without creation timestamps.
    #[serde(rename = "id")]
    #[strum(serialize = "id")]
    IdDesc,
}

/// A fully scoped read against the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoQuery {
    /// Mandatory owner filter.
    pub owner: UserId,
    /// Case-insensitive substring filter on `text`.
    pub search: Option<String>,
    /// Equality filter on `completed`.
    pub completed: Option<bool>,
    pub order: SortOrder,
    /// First row of the window (zero based).
    pub offset: usize,
    /// Maximum rows in the window.
    pub limit: usize,
}

impl TodoQuery {
    /// Returns true if `todo` satisfies every filter (the window is ignored).
    pub fn matches(&self, todo: &Todo) -> bool {
        if todo.user_id != self.owner {
            return false;
        }
        if self.completed.is_some_and(|completed| todo.completed != completed) {
            return false;
        }
        match &self.search {
            Some(needle) => text_contains(&todo.text, needle),
            None => true,
        }
    }

    /// Sorts records in place according to [`TodoQuery::order`].
    pub fn sort(&self, todos: &mut [Todo]) {
        match self.order {
            SortOrder::CreatedAtDesc => {
                todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
            SortOrder::IdDesc => todos.sort_by(|a, b| b.id.cmp(&a.id)),
        }
    }
}

/// Case-insensitive substring test used for search filtering.
pub fn text_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One window of matching records plus the size of the whole result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    /// Newest first.
    pub items: Vec<Todo>,
    /// Number of records matching the filters, ignoring the window.
    pub total_count: u64,
}

impl ResultPage {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `ceil(total_count / page_size)`.
    pub fn total_pages(&self, page_size: usize) -> u64 {
        total_pages(self.total_count, page_size)
    }
}

/// `ceil(total_count / page_size)`; zero when `page_size` is zero.
pub fn total_pages(total_count: u64, page_size: usize) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size as u64)
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Auth,
    Store,
}
