// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local projection of the current result page.
//!
//! Readable by anyone; writable only from this crate. Full replacement
//! belongs to the fetch controller, targeted patches to the mutation
//! controller.

use todosync_core::{ResultPage, Todo, TodoId, TodoPatch};

/// The page of records currently shown, plus the size of the full result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoCache {
    items: Vec<Todo>,
    total_count: u64,
    loaded: bool,
}

impl TodoCache {
    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.items.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True once a fetch has populated the cache since it was last cleared.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn replace(&mut self, page: ResultPage) {
        self.items = page.items;
        self.total_count = page.total_count;
        self.loaded = true;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Puts a new record at the top if the page has room for it.
    ///
    /// A record already on the page is left where it is and counts as shown.
    pub(crate) fn prepend(&mut self, todo: Todo, capacity: usize) -> bool {
        if self.get(todo.id).is_some() {
            return true;
        }
        if self.items.len() >= capacity {
            return false;
        }
        self.items.insert(0, todo);
        self.total_count += 1;
        true
    }

    pub(crate) fn remove(&mut self, id: TodoId) -> Option<Todo> {
        let index = self.items.iter().position(|t| t.id == id)?;
        self.total_count = self.total_count.saturating_sub(1);
        Some(self.items.remove(index))
    }

    pub(crate) fn patch(&mut self, id: TodoId, patch: &TodoPatch) -> bool {
        match self.items.iter_mut().find(|t| t.id == id) {
            Some(todo) => {
                patch.apply(todo);
                true
            }
            None => false,
        }
    }
}
