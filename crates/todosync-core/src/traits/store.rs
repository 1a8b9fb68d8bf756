// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for the remote `todos` table.

use async_trait::async_trait;

use crate::error::TodoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NewTodo, ResultPage, Session, Todo, TodoMatch, TodoPatch, TodoQuery};

/// Adapter for the remote, filterable record store.
///
/// Every call carries the caller's [`Session`] as credentials. Scoping is the
/// caller's job: [`TodoQuery`] and [`TodoMatch`] always name the owner, and
/// implementations must send that predicate as-is rather than rely on
/// server-side policies alone.
#[async_trait]
pub trait TodoStore: PluginAdapter {
    /// Runs a filtered, ordered, windowed read.
    ///
    /// `total_count` counts every matching row, ignoring the window.
    async fn scoped_query(&self, auth: &Session, query: &TodoQuery)
    -> Result<ResultPage, TodoError>;

    /// Inserts a record and returns it with its remote-assigned fields.
    async fn insert(&self, auth: &Session, record: &NewTodo) -> Result<Todo, TodoError>;

    /// Applies `patch` to rows matching `matching`; returns the number of rows changed.
    async fn update(
        &self,
        auth: &Session,
        patch: &TodoPatch,
        matching: &TodoMatch,
    ) -> Result<u64, TodoError>;

    /// Deletes rows matching `matching`; returns the number of rows removed.
    async fn delete(&self, auth: &Session, matching: &TodoMatch) -> Result<u64, TodoError>;
}
