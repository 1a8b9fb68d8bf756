// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `todosync shell` command implementation.
//!
//! An interactive REPL with readline history. Each line is parsed into a
//! [`ShellCommand`], most of which are forwarded to the controller as
//! [`Intent`]s, and the view is re-rendered after every command. The
//! controller's run loop is spawned alongside so session expiry and search
//! debounce keep working while the prompt waits.

use std::sync::Arc;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use todosync_core::{TodoError, TodoId};
use todosync_controller::{Intent, TodoController};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::commands;
use crate::render::{parse_filter, render_view};

const HELP: &str = "\
commands:
  ls                      reload the current page
  search [text]           filter by text (empty clears)
  filter all|completed|pending
  page <n> | next | prev  move between pages
  add <text>              create a todo
  toggle <id>             flip completion
  rm <id>                 delete a todo
  edit <id> [text]        start editing; with text, save immediately
  draft <text>            replace the edit draft
  save | cancel           commit or abandon the edit
  login <email> | signup <email> | logout
  help | quit";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Intents dispatched in order; the first failure stops the rest.
    Intents(Vec<Intent>),
    Refresh,
    Login(String),
    Signup(String),
    Logout,
    Help,
    Quit,
}

fn parse_id(arg: &str) -> Result<TodoId, String> {
    arg.trim_start_matches('#')
        .parse::<i64>()
        .map(TodoId)
        .map_err(|_| format!("not a todo id: {arg:?}"))
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest)
    }
}

/// Parses one input line.
pub fn parse_line(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "ls" | "refresh" => ShellCommand::Refresh,
        "search" => ShellCommand::Intents(vec![
            Intent::SetSearch(rest.to_string()),
            Intent::SubmitSearch,
        ]),
        "filter" => ShellCommand::Intents(vec![Intent::SetFilter(parse_filter(required(
            rest,
            "filter all|completed|pending",
        )?)?)]),
        "page" => {
            let page = required(rest, "page <n>")?
                .parse::<usize>()
                .map_err(|_| format!("not a page number: {rest:?}"))?;
            ShellCommand::Intents(vec![Intent::SetPage(page)])
        }
        "next" => ShellCommand::Intents(vec![Intent::NextPage]),
        "prev" => ShellCommand::Intents(vec![Intent::PrevPage]),
        "add" => ShellCommand::Intents(vec![
            Intent::SetCompose(rest.to_string()),
            Intent::Create,
        ]),
        "toggle" | "done" => {
            ShellCommand::Intents(vec![Intent::Toggle(parse_id(required(rest, "toggle <id>")?)?)])
        }
        "rm" | "delete" => {
            ShellCommand::Intents(vec![Intent::Delete(parse_id(required(rest, "rm <id>")?)?)])
        }
        "edit" => {
            let args = required(rest, "edit <id> [text]")?;
            let (id, text) = match args.split_once(char::is_whitespace) {
                Some((id, text)) => (id, Some(text.trim())),
                None => (args, None),
            };
            let mut intents = vec![Intent::OpenEdit(parse_id(id)?)];
            if let Some(text) = text {
                intents.push(Intent::SetDraft(text.to_string()));
                intents.push(Intent::CommitEdit);
            }
            ShellCommand::Intents(intents)
        }
        "draft" => ShellCommand::Intents(vec![Intent::SetDraft(rest.to_string())]),
        "save" => ShellCommand::Intents(vec![Intent::CommitEdit]),
        "cancel" => ShellCommand::Intents(vec![Intent::CancelEdit]),
        "login" => ShellCommand::Login(required(rest, "login <email>")?.to_string()),
        "signup" => ShellCommand::Signup(required(rest, "signup <email>")?.to_string()),
        "logout" => ShellCommand::Logout,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "/quit" | "/exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command {other:?}; try `help`")),
    };
    Ok(command)
}

/// Runs a command that needs no terminal interaction. Returns a message to
/// print, if any.
pub async fn execute(
    controller: &TodoController,
    command: ShellCommand,
) -> Result<Option<String>, TodoError> {
    match command {
        ShellCommand::Intents(intents) => {
            for intent in intents {
                controller.dispatch(intent).await?;
            }
            Ok(None)
        }
        ShellCommand::Refresh => {
            controller.refresh().await?;
            Ok(None)
        }
        ShellCommand::Logout => commands::logout(controller).await.map(Some),
        ShellCommand::Help => Ok(Some(HELP.to_string())),
        ShellCommand::Login(_) | ShellCommand::Signup(_) | ShellCommand::Quit => Ok(None),
    }
}

/// Runs the `todosync shell` interactive REPL.
pub async fn run_shell(controller: Arc<TodoController>, color: bool) -> Result<(), TodoError> {
    let cancel = CancellationToken::new();
    let runner = {
        let controller = Arc::clone(&controller);
        let cancel = cancel.clone();
        tokio::spawn(async move { controller.run(cancel).await })
    };

    let mut rl = DefaultEditor::new()
        .map_err(|e| TodoError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "todosync shell".bold().green());
    println!("Type {} for commands, {} to exit.\n", "help".yellow(), "quit".yellow());
    print!("{}", render_view(&controller.view().await, color));

    let prompt = format!("{}> ", "todosync".green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(&line);

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message.yellow());
                continue;
            }
        };
        debug!(?command, "shell command");

        let outcome = match command {
            ShellCommand::Quit => break,
            ShellCommand::Login(email) => match crate::read_password() {
                Ok(password) => commands::login(&controller, &email, password).await.map(Some),
                Err(e) => Err(e),
            },
            ShellCommand::Signup(email) => match crate::read_password() {
                Ok(password) => commands::signup(&controller, &email, password).await.map(Some),
                Err(e) => Err(e),
            },
            other => execute(&controller, other).await,
        };

        match outcome {
            Ok(Some(message)) => println!("{message}"),
            Ok(None) => {}
            Err(e) if e.is_validation() => eprintln!("{}", e.to_string().yellow()),
            Err(e) => eprintln!("{}: {e}", "error".red()),
        }
        print!("{}", render_view(&controller.view().await, color));
    }

    cancel.cancel();
    match runner.await {
        Ok(Err(e)) => warn!(error = %e, "controller loop ended with an error"),
        Err(e) => warn!(error = %e, "controller loop panicked"),
        Ok(Ok(())) => {}
    }
    println!("{}", "goodbye".dimmed());
    Ok(())
}
