// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline edit state: which record is being edited and its draft text.

use todosync_core::{Todo, TodoId};

/// At most one record is edited at a time. Opening another record replaces
/// the current edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    target: Option<TodoId>,
    draft: String,
}

impl EditSession {
    /// Starts editing `todo` with its current text as the draft.
    pub fn open(&mut self, todo: &Todo) {
        self.target = Some(todo.id);
        self.draft = todo.text.clone();
    }

    pub fn cancel(&mut self) {
        self.target = None;
        self.draft.clear();
    }

    /// Replaces the draft. Ignored when nothing is open.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        if self.target.is_some() {
            self.draft = text.into();
        }
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target_id(&self) -> Option<TodoId> {
        self.target
    }

    pub fn draft_text(&self) -> &str {
        &self.draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: i64, text: &str) -> Todo {
        Todo {
            id: TodoId(id),
            text: text.to_string(),
            completed: false,
            user_id: "alice".into(),
            created_at: None,
        }
    }

    #[test]
    fn open_seeds_draft_and_cancel_clears_it() {
        let mut edit = EditSession::default();
        edit.open(&todo(1, "walk dog"));
        assert_eq!(edit.target_id(), Some(TodoId(1)));
        assert_eq!(edit.draft_text(), "walk dog");

        edit.set_draft("walk cat");
        assert_eq!(edit.draft_text(), "walk cat");

        edit.cancel();
        assert!(!edit.is_open());
        assert_eq!(edit.draft_text(), "");
    }

    #[test]
    fn opening_another_record_replaces_the_edit() {
        let mut edit = EditSession::default();
        edit.open(&todo(1, "walk dog"));
        edit.set_draft("half typed");
        edit.open(&todo(2, "buy milk"));
        assert_eq!(edit.target_id(), Some(TodoId(2)));
        assert_eq!(edit.draft_text(), "buy milk");
    }

    #[test]
    fn draft_without_target_is_ignored() {
        let mut edit = EditSession::default();
        edit.set_draft("orphan");
        assert_eq!(edit.draft_text(), "");
    }
}
