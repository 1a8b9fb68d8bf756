// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory record store for deterministic testing.
//!
//! `InMemoryTodoStore` implements `TodoStore` the way the hosted table
//! does: filters, ordering, windowing and an exact total count. On top of
//! that it can fail the next call, hold the next query or insert until
//! released, and pretend to forget the owner filter so callers' own scoping can be tested.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use todosync_core::{
    AdapterType, HealthStatus, NewTodo, PluginAdapter, ResultPage, Session, Todo, TodoError,
    TodoId, TodoMatch, TodoPatch, TodoQuery, TodoStore, UserId,
};

/// Seconds since the epoch of the first record's `created_at`.
const EPOCH_BASE: i64 = 1_767_225_600;

#[derive(Default)]
struct StoreInner {
    rows: Vec<Todo>,
    next_id: i64,
    fail_next: Option<String>,
    ignore_owner: bool,
    held: Option<Arc<Notify>>,
    held_insert: Option<InsertGate>,
    query_calls: usize,
    write_calls: usize,
}

impl StoreInner {
    fn take_failure(&mut self) -> Result<(), TodoError> {
        match self.fail_next.take() {
            Some(message) => Err(TodoError::remote(Some(503), message)),
            None => Ok(()),
        }
    }

    fn push(&mut self, owner: UserId, text: &str, completed: bool) -> Todo {
        self.next_id += 1;
        let todo = Todo {
            id: TodoId(self.next_id),
            text: text.to_string(),
            completed,
            user_id: owner,
            created_at: DateTime::<Utc>::from_timestamp(EPOCH_BASE + self.next_id, 0),
        };
        self.rows.push(todo.clone());
        todo
    }

    fn scoped(&self, matching: &TodoMatch) -> impl Iterator<Item = usize> + '_ {
        let matching = matching.clone();
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, t)| matching.matches(t))
            .map(|(i, _)| i)
    }
}

/// Releases a query held by [`InMemoryTodoStore::hold_next_query`].
#[derive(Clone)]
pub struct QueryGate {
    notify: Arc<Notify>,
}

impl QueryGate {
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// Pauses an insert held by [`InMemoryTodoStore::hold_next_insert`] after
/// the row is stored but before the call returns.
#[derive(Clone)]
pub struct InsertGate {
    committed: Arc<Notify>,
    release: Arc<Notify>,
}

impl InsertGate {
    /// Resolves once the held insert has stored its row.
    pub async fn committed(&self) {
        self.committed.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// A record store backed by a `Vec`.
pub struct InMemoryTodoStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts a row directly, bypassing failure injection and call counts.
    /// Later rows have later `created_at` values.
    pub fn seed(&self, owner: &str, text: &str, completed: bool) -> Todo {
        self.inner().push(UserId::from(owner), text, completed)
    }

    /// Makes the next call of any kind fail with a remote error.
    pub fn fail_next(&self, message: &str) {
        self.inner().fail_next = Some(message.to_string());
    }

    /// When set, queries return rows of every owner.
    pub fn ignore_owner_filter(&self, ignore: bool) {
        self.inner().ignore_owner = ignore;
    }

    /// The next query waits until the returned gate is released. Its result
    /// reflects the rows at release time.
    pub fn hold_next_query(&self) -> QueryGate {
        let notify = Arc::new(Notify::new());
        self.inner().held = Some(notify.clone());
        QueryGate { notify }
    }

    /// The next insert stores its row, then waits until the returned gate
    /// is released before reporting success.
    pub fn hold_next_insert(&self) -> InsertGate {
        let gate = InsertGate {
            committed: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        self.inner().held_insert = Some(gate.clone());
        gate
    }

    pub fn query_calls(&self) -> usize {
        self.inner().query_calls
    }

    /// Inserts, updates and deletes that reached the store.
    pub fn write_calls(&self) -> usize {
        self.inner().write_calls
    }

    pub fn all(&self) -> Vec<Todo> {
        self.inner().rows.clone()
    }

    pub fn get(&self, id: TodoId) -> Option<Todo> {
        self.inner().rows.iter().find(|t| t.id == id).cloned()
    }
}

impl Default for InMemoryTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for InMemoryTodoStore {
    fn name(&self) -> &str {
        "memory-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, TodoError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn scoped_query(
        &self,
        _auth: &Session,
        query: &TodoQuery,
    ) -> Result<ResultPage, TodoError> {
        let held = {
            let mut inner = self.inner();
            inner.query_calls += 1;
            inner.held.take()
        };
        if let Some(gate) = held {
            gate.notified().await;
        }

        let mut inner = self.inner();
        inner.take_failure()?;
        let mut matching: Vec<Todo> = inner
            .rows
            .iter()
            .filter(|t| {
                if inner.ignore_owner {
                    TodoQuery {
                        owner: t.user_id.clone(),
                        ..query.clone()
                    }
                    .matches(t)
                } else {
                    query.matches(t)
                }
            })
            .cloned()
            .collect();
        query.sort(&mut matching);
        let total_count = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok(ResultPage { items, total_count })
    }

    async fn insert(&self, auth: &Session, record: &NewTodo) -> Result<Todo, TodoError> {
        let (todo, held) = {
            let mut inner = self.inner();
            inner.write_calls += 1;
            inner.take_failure()?;
            if record.user_id != auth.user_id {
                return Err(TodoError::remote(
                    Some(403),
                    "new row violates row-level security policy",
                ));
            }
            let todo = inner.push(record.user_id.clone(), &record.text, record.completed);
            (todo, inner.held_insert.take())
        };
        if let Some(gate) = held {
            gate.committed.notify_one();
            gate.release.notified().await;
        }
        Ok(todo)
    }

    async fn update(
        &self,
        _auth: &Session,
        patch: &TodoPatch,
        matching: &TodoMatch,
    ) -> Result<u64, TodoError> {
        let mut inner = self.inner();
        inner.write_calls += 1;
        inner.take_failure()?;
        let hits: Vec<usize> = inner.scoped(matching).collect();
        for &i in &hits {
            patch.apply(&mut inner.rows[i]);
        }
        Ok(hits.len() as u64)
    }

    async fn delete(&self, _auth: &Session, matching: &TodoMatch) -> Result<u64, TodoError> {
        let mut inner = self.inner();
        inner.write_calls += 1;
        inner.take_failure()?;
        let before = inner.rows.len();
        inner.rows.retain(|t| !matching.matches(t));
        Ok((before - inner.rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_session;
    use todosync_core::SortOrder;

    fn query(owner: &str) -> TodoQuery {
        TodoQuery {
            owner: owner.into(),
            search: None,
            completed: None,
            order: SortOrder::default(),
            offset: 0,
            limit: 10,
        }
    }

    #[tokio::test]
    async fn query_orders_newest_first_and_counts_all_matches() {
        let store = InMemoryTodoStore::new();
        store.seed("alice", "first", false);
        store.seed("alice", "second", false);
        store.seed("bob", "other", false);

        let page = store
            .scoped_query(&test_session("alice"), &TodoQuery {
                limit: 1,
                ..query("alice")
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text, "second");
    }

    #[tokio::test]
    async fn leaky_mode_returns_every_owner() {
        let store = InMemoryTodoStore::new();
        store.seed("alice", "mine", false);
        store.seed("bob", "theirs", false);
        store.ignore_owner_filter(true);
        let page = store
            .scoped_query(&test_session("alice"), &query("alice"))
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn held_insert_is_visible_before_it_returns() {
        let store = InMemoryTodoStore::new();
        let gate = store.hold_next_insert();
        let record = NewTodo {
            text: "buy milk".into(),
            completed: false,
            user_id: "alice".into(),
        };
        let session = test_session("alice");
        let (inserted, seen) = tokio::join!(
            store.insert(&session, &record),
            async {
                gate.committed().await;
                let seen = store.all().len();
                gate.release();
                seen
            }
        );
        assert_eq!(seen, 1);
        assert_eq!(inserted.unwrap().text, "buy milk");
    }

    #[tokio::test]
    async fn search_treats_star_as_a_character() {
        let store = InMemoryTodoStore::new();
        store.seed("alice", "buy 2*4 lumber", false);
        store.seed("alice", "buy 2x4 lumber", false);
        let page = store
            .scoped_query(&test_session("alice"), &TodoQuery {
                search: Some("2*4".into()),
                ..query("alice")
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].text, "buy 2*4 lumber");
    }

    #[tokio::test]
    async fn update_matches_id_and_owner() {
        let store = InMemoryTodoStore::new();
        let todo = store.seed("alice", "mine", false);
        let foreign = TodoMatch {
            id: todo.id,
            owner: "bob".into(),
        };
        let affected = store
            .update(&test_session("bob"), &TodoPatch::completed(true), &foreign)
            .await
            .unwrap();
        assert_eq!(affected, 0);
        assert!(!store.get(todo.id).unwrap().completed);
    }
}
