// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Todo mutation controller.
//!
//! Create, delete, toggle and edit, each scoped to the session's user on
//! every predicate. Toggling is scoped by `(id, owner)` like delete and
//! update. Empty text is rejected locally before any network call. Store
//! failures come back as [`TodoError::Mutation`] and are never retried.

use std::sync::Arc;

use todosync_core::types::text_contains;
use todosync_core::{NewTodo, Session, Todo, TodoError, TodoId, TodoMatch, TodoPatch, TodoStore};
use tracing::{debug, warn};

use crate::cache::TodoCache;
use crate::query::QueryParams;

/// How the local page caught up with a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// The cache was patched in place.
    Patched,
    /// The cache could not be patched faithfully; re-run the query.
    Refetch,
}

/// Trims `text` and rejects it if nothing is left.
pub fn validate_text(text: &str) -> Result<&str, TodoError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TodoError::Validation("todo text must not be empty".to_string()));
    }
    Ok(trimmed)
}

fn require_session(session: Option<&Session>) -> Result<&Session, TodoError> {
    session.ok_or_else(|| TodoError::auth("sign in to change todos"))
}

fn scope(session: &Session, id: TodoId) -> TodoMatch {
    TodoMatch {
        id,
        owner: session.user_id.clone(),
    }
}

fn expect_one(affected: u64, id: TodoId) -> Result<(), TodoError> {
    if affected == 0 {
        return Err(TodoError::Mutation {
            message: format!("no todo {id} owned by the current user"),
            source: None,
        });
    }
    Ok(())
}

/// Issues owner-scoped writes against the record store.
pub struct MutationController {
    store: Arc<dyn TodoStore>,
}

impl MutationController {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    /// Inserts a new, incomplete record for the session's user.
    pub async fn create(&self, session: Option<&Session>, text: &str) -> Result<Todo, TodoError> {
        let text = validate_text(text)?;
        let session = require_session(session)?;
        let record = NewTodo {
            text: text.to_string(),
            completed: false,
            user_id: session.user_id.clone(),
        };
        let created = self
            .store
            .insert(session, &record)
            .await
            .map_err(TodoError::into_mutation)?;
        if created.user_id != session.user_id {
            warn!(id = %created.id, owner = %created.user_id, "store assigned a different owner");
        }
        debug!(id = %created.id, "todo created");
        Ok(created)
    }

    /// Deletes the record `id` if the session's user owns it.
    pub async fn delete(&self, session: Option<&Session>, id: TodoId) -> Result<(), TodoError> {
        let session = require_session(session)?;
        let affected = self
            .store
            .delete(session, &scope(session, id))
            .await
            .map_err(TodoError::into_mutation)?;
        expect_one(affected, id)?;
        debug!(%id, "todo deleted");
        Ok(())
    }

    /// Flips `completed` and returns the record as it now stands.
    pub async fn toggle_completion(
        &self,
        session: Option<&Session>,
        todo: &Todo,
    ) -> Result<Todo, TodoError> {
        let session = require_session(session)?;
        let patch = TodoPatch::completed(!todo.completed);
        let affected = self
            .store
            .update(session, &patch, &scope(session, todo.id))
            .await
            .map_err(TodoError::into_mutation)?;
        expect_one(affected, todo.id)?;
        let mut toggled = todo.clone();
        patch.apply(&mut toggled);
        debug!(id = %todo.id, completed = toggled.completed, "todo toggled");
        Ok(toggled)
    }

    /// Replaces the text of `id`; returns the stored (trimmed) text.
    pub async fn update_text(
        &self,
        session: Option<&Session>,
        id: TodoId,
        new_text: &str,
    ) -> Result<String, TodoError> {
        let text = validate_text(new_text)?;
        let session = require_session(session)?;
        let affected = self
            .store
            .update(session, &TodoPatch::text(text), &scope(session, id))
            .await
            .map_err(TodoError::into_mutation)?;
        expect_one(affected, id)?;
        debug!(%id, "todo text updated");
        Ok(text.to_string())
    }

    /// Puts a created record on the current page when it belongs there and
    /// fits; anything else needs a refetch.
    pub(crate) fn apply_created(
        &self,
        cache: &mut TodoCache,
        todo: Todo,
        params: &QueryParams,
    ) -> Reconcile {
        if params.page == 1 && visible_under(&todo, params) && cache.prepend(todo, params.page_size) {
            Reconcile::Patched
        } else {
            Reconcile::Refetch
        }
    }

    /// Removes a deleted record from the page.
    ///
    /// The page needs a refetch when it was left empty while other records
    /// remain, or when records beyond it should shift up into the gap.
    pub(crate) fn apply_deleted(
        &self,
        cache: &mut TodoCache,
        id: TodoId,
        params: &QueryParams,
    ) -> Reconcile {
        if cache.remove(id).is_none() {
            return Reconcile::Refetch;
        }
        let shown = (params.offset() + cache.items().len()) as u64;
        if (cache.is_empty() && cache.total_count() > 0) || cache.total_count() > shown {
            Reconcile::Refetch
        } else {
            Reconcile::Patched
        }
    }

    /// Applies an edit or toggle to the record in place. A record the patch
    /// moves out of the current filter or search needs a refetch.
    pub(crate) fn apply_patch(
        &self,
        cache: &mut TodoCache,
        id: TodoId,
        patch: &TodoPatch,
        params: &QueryParams,
    ) -> Reconcile {
        if !cache.patch(id, patch) {
            return Reconcile::Refetch;
        }
        match cache.get(id) {
            Some(todo) if visible_under(todo, params) => Reconcile::Patched,
            _ => Reconcile::Refetch,
        }
    }
}

fn visible_under(todo: &Todo, params: &QueryParams) -> bool {
    params
        .filter
        .completed()
        .is_none_or(|completed| completed == todo.completed)
        && (params.search.is_empty() || text_contains(&todo.text, &params.search))
}
