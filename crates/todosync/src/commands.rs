// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: `login`, `signup`, `logout`, `list` and `add`.
//!
//! Each takes a started [`TodoController`] and leaves printing to the caller.

use todosync_core::{AuthState, CompletionFilter, Credentials, Todo, TodoError};
use todosync_controller::{TodoController, ViewState};
use tracing::info;

/// Arguments of `todosync list`.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub filter: Option<CompletionFilter>,
    pub search: Option<String>,
    pub page: usize,
}

fn require_session(controller: &TodoController) -> Result<(), TodoError> {
    match controller.sessions().state() {
        AuthState::Authenticated(_) => Ok(()),
        _ => Err(TodoError::auth("not signed in; run `todosync login <email>` first")),
    }
}

/// Signs in and reports who is now signed in.
pub async fn login(
    controller: &TodoController,
    email: &str,
    password: String,
) -> Result<String, TodoError> {
    let session = controller
        .sign_in(&Credentials::new(email, password))
        .await?;
    info!(user = %session.user_id, "signed in");
    Ok(format!(
        "signed in as {}",
        session.email.as_deref().unwrap_or(email)
    ))
}

/// Registers an account. The provider may hold the session back until the
/// address is confirmed.
pub async fn signup(
    controller: &TodoController,
    email: &str,
    password: String,
) -> Result<String, TodoError> {
    match controller
        .sign_up(&Credentials::new(email, password))
        .await?
    {
        Some(_) => Ok(format!("account created, signed in as {email}")),
        None => Ok(format!(
            "account created; confirm the address sent to {email}, then run `todosync login`"
        )),
    }
}

pub async fn logout(controller: &TodoController) -> Result<String, TodoError> {
    if controller.sessions().current_session().is_none() {
        return Ok("not signed in".to_string());
    }
    controller.sign_out().await?;
    Ok("signed out".to_string())
}

/// Loads one page with the requested filters.
pub async fn list(controller: &TodoController, args: ListArgs) -> Result<ViewState, TodoError> {
    require_session(controller)?;
    if let Some(filter) = args.filter {
        controller.set_filter(filter).await?;
    }
    if let Some(search) = args.search {
        controller.set_search(search).await;
        controller.submit_search().await?;
    }
    if args.page > 1 {
        controller.set_page(args.page).await?;
    }
    Ok(controller.view().await)
}

pub async fn add(controller: &TodoController, text: &str) -> Result<Todo, TodoError> {
    require_session(controller)?;
    controller.create(text).await
}
