// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text rendering of the controller's view snapshot.

use colored::Colorize;
use todosync_core::{AuthState, CompletionFilter, Todo};
use todosync_controller::ViewState;

/// Renders `view` as the lines printed by `list` and the shell.
pub fn render_view(view: &ViewState, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&header(view, color));
    out.push('\n');

    if view.auth.session().is_none() {
        return out;
    }

    if view.items.is_empty() {
        let empty = "  (no todos)";
        out.push_str(&if color { empty.dimmed().to_string() } else { empty.to_string() });
        out.push('\n');
    }
    for todo in &view.items {
        out.push_str(&todo_line(todo, view, color));
        out.push('\n');
    }

    let footer = format!(
        "  page {}/{}  ({} total)",
        view.page,
        view.total_pages.max(1),
        view.total_count
    );
    out.push_str(&if color { footer.dimmed().to_string() } else { footer });
    out.push('\n');

    if let Some(error) = &view.last_error {
        let line = format!("  error: {error}");
        out.push_str(&if color { line.red().to_string() } else { line });
        out.push('\n');
    }
    out
}

fn header(view: &ViewState, color: bool) -> String {
    let who = match &view.auth {
        AuthState::Loading => return "  restoring session...".to_string(),
        AuthState::Unauthenticated => {
            let line = "  signed out (run `todosync login`)";
            return if color { line.yellow().to_string() } else { line.to_string() };
        }
        AuthState::Authenticated(session) => session
            .email
            .clone()
            .unwrap_or_else(|| session.user_id.to_string()),
    };
    let mut line = format!("  {who}  filter: {}", view.filter);
    if !view.search.is_empty() {
        line.push_str(&format!("  search: {:?}", view.search));
    }
    if view.loading {
        line.push_str("  (loading)");
    }
    if color { line.bold().to_string() } else { line }
}

fn todo_line(todo: &Todo, view: &ViewState, color: bool) -> String {
    let mark = if todo.completed { "[x]" } else { "[ ]" };
    let id = format!("#{}", todo.id);
    let editing = view.edit.target_id() == Some(todo.id);
    let mut line = if color {
        let text = if todo.completed {
            todo.text.dimmed().strikethrough().to_string()
        } else {
            todo.text.clone()
        };
        format!("  {} {:>5}  {text}", mark.green(), id.cyan())
    } else {
        format!("  {mark} {id:>5}  {}", todo.text)
    };
    if editing {
        let draft = format!("  (editing: {:?})", view.edit.draft_text());
        line.push_str(&if color { draft.yellow().to_string() } else { draft });
    }
    line
}

/// Parses a filter name as typed on the command line.
pub fn parse_filter(value: &str) -> Result<CompletionFilter, String> {
    value
        .parse::<CompletionFilter>()
        .map_err(|_| format!("unknown filter {value:?} (expected all, completed or pending)"))
}
