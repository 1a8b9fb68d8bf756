// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! todosync - a per-user todo list kept in sync with a hosted backend.
//!
//! This is the binary entry point: it loads configuration, installs
//! logging, wires the hosted adapters into a controller and runs the
//! requested subcommand.

mod commands;
mod doctor;
mod render;
mod shell;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use todosync_config::TodosyncConfig;
use todosync_core::{CompletionFilter, TodoError};
use todosync_controller::{ControllerOptions, SessionManager, TodoController};

/// todosync - a per-user todo list kept in sync with a hosted backend.
#[derive(Parser, Debug)]
#[command(name = "todosync", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the interactive shell (default).
    Shell,
    /// Sign in with e-mail and password.
    Login { email: String },
    /// Create an account.
    Signup { email: String },
    /// Sign out and forget the stored session.
    Logout,
    /// Print one page of todos.
    List {
        #[arg(long, value_parser = render::parse_filter)]
        filter: Option<CompletionFilter>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Create a todo.
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Manage configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Check connectivity to the configured backend.
    Doctor,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration and report every problem found.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => todosync_config::load_and_validate_path(path),
        None => todosync_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            todosync_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let color = !cli.plain && std::io::stdout().is_terminal();
    match run(cli.command.unwrap_or(Commands::Shell), &config, color).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {e}", "error".red());
            std::process::exit(1);
        }
    }
}

/// Runs one subcommand. `Ok(false)` means it completed but reported failure.
async fn run(command: Commands, config: &TodosyncConfig, color: bool) -> Result<bool, TodoError> {
    match command {
        Commands::Config {
            action: ConfigCommand::Check,
        } => {
            println!("configuration ok (remote: {})", config.remote.url);
            return Ok(true);
        }
        Commands::Doctor => return doctor::run_doctor(config, color).await.map(|failed| !failed),
        _ => {}
    }

    let controller = build_controller(config)?;
    controller.start().await?;

    match command {
        Commands::Shell => shell::run_shell(controller, color).await?,
        Commands::Login { email } => {
            let password = read_password()?;
            println!("{}", commands::login(&controller, &email, password).await?);
        }
        Commands::Signup { email } => {
            let password = read_password()?;
            println!("{}", commands::signup(&controller, &email, password).await?);
        }
        Commands::Logout => println!("{}", commands::logout(&controller).await?),
        Commands::List {
            filter,
            search,
            page,
        } => {
            let args = commands::ListArgs {
                filter,
                search,
                page,
            };
            let view = commands::list(&controller, args).await?;
            print!("{}", render::render_view(&view, color));
        }
        Commands::Add { text } => {
            let todo = commands::add(&controller, &text.join(" ")).await?;
            println!("added #{}: {}", todo.id, todo.text);
        }
        Commands::Config { .. } | Commands::Doctor => {}
    }
    Ok(true)
}

/// Wires the hosted adapters into a controller.
fn build_controller(config: &TodosyncConfig) -> Result<Arc<TodoController>, TodoError> {
    let connection = todosync_supabase::connect(config)?;
    let sessions = Arc::new(
        SessionManager::new(Arc::new(connection.auth))
            .with_refresh_margin(Duration::from_secs(config.session.refresh_margin_secs)),
    );
    Ok(Arc::new(TodoController::new(
        sessions,
        Arc::new(connection.store),
        ControllerOptions::from_config(config),
    )))
}

/// Prompts for a password without echoing it.
pub(crate) fn read_password() -> Result<String, TodoError> {
    rpassword::prompt_password("password: ")
        .map_err(|e| TodoError::Internal(format!("failed to read password: {e}")))
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("todosync={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
