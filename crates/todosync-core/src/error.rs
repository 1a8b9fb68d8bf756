// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the todosync client.

use thiserror::Error;

/// Boxed error source carried by the remote-facing variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The error type shared by every todosync crate.
///
/// The first four variants form the user-facing taxonomy (authentication,
/// local validation, failed reads, failed writes). Adapters report transport
/// problems as [`TodoError::Remote`]; the fetch and mutation controllers wrap
/// those into [`TodoError::Fetch`] and [`TodoError::Mutation`] so callers can
/// tell which operation failed.
#[derive(Debug, Error)]
pub enum TodoError {
    /// Bad credentials, provider rejection, or no active session.
    #[error("authentication error: {message}")]
    Auth {
        message: String,
        source: Option<BoxError>,
    },

    /// Input rejected locally before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// A read against the record store failed.
    #[error("fetch failed: {message}")]
    Fetch {
        message: String,
        source: Option<BoxError>,
    },

    /// A write against the record store failed or matched nothing.
    #[error("mutation failed: {message}")]
    Mutation {
        message: String,
        source: Option<BoxError>,
    },

    /// Adapter-level failure talking to the remote service.
    #[error("remote error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// Local persistence errors (session file I/O, serialization).
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// Configuration errors (invalid values, missing required settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TodoError {
    /// Shorthand for an [`TodoError::Auth`] without a source.
    pub fn auth(message: impl Into<String>) -> Self {
        TodoError::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`TodoError::Remote`].
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        TodoError::Remote {
            status,
            message: message.into(),
        }
    }

    /// Re-labels a provider failure as an authentication error.
    pub fn into_auth(self) -> Self {
        match self {
            e @ TodoError::Auth { .. } => e,
            other => TodoError::Auth {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Re-labels a store failure as a failed read.
    ///
    /// Already-classified `Fetch` and `Validation` errors pass through untouched.
    pub fn into_fetch(self) -> Self {
        match self {
            e @ (TodoError::Fetch { .. } | TodoError::Validation(_)) => e,
            other => TodoError::Fetch {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Re-labels a store failure as a failed write.
    ///
    /// Already-classified `Mutation` and `Validation` errors pass through untouched.
    pub fn into_mutation(self) -> Self {
        match self {
            e @ (TodoError::Mutation { .. } | TodoError::Validation(_)) => e,
            other => TodoError::Mutation {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }

    /// Returns true for [`TodoError::Auth`].
    pub fn is_auth(&self) -> bool {
        matches!(self, TodoError::Auth { .. })
    }

    /// Returns true for [`TodoError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, TodoError::Validation(_))
    }

    /// Returns true for [`TodoError::Fetch`].
    pub fn is_fetch(&self) -> bool {
        matches!(self, TodoError::Fetch { .. })
    }

    /// Returns true for [`TodoError::Mutation`].
    pub fn is_mutation(&self) -> bool {
        matches!(self, TodoError::Mutation { .. })
    }
}
