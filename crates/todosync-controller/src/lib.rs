// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-scoped todo synchronization.
//!
//! [`TodoController`] binds an authentication session to a filtered,
//! paginated, searchable view of the user's remote todos and keeps that
//! view consistent with the mutations issued through it. The pieces it is
//! built from are public for callers that want only part of the behavior.

pub mod cache;
pub mod controller;
pub mod edit;
pub mod fetch;
pub mod mutation;
pub mod query;
pub mod session;

pub use cache::TodoCache;
pub use controller::{ControllerOptions, Intent, TodoController, ViewState};
pub use edit::EditSession;
pub use fetch::{FetchController, FetchOutcome, FetchTicket};
pub use mutation::{MutationController, Reconcile, validate_text};
pub use query::{QueryParams, QueryState};
pub use session::SessionManager;
