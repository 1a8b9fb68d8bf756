// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication provider trait.

use async_trait::async_trait;

use crate::error::TodoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Credentials, Session};

/// Adapter for the hosted authentication provider.
///
/// Implementations own session persistence: a session returned from
/// [`sign_in`](AuthAdapter::sign_in) or [`refresh`](AuthAdapter::refresh) is
/// what [`restore_session`](AuthAdapter::restore_session) hands back on the
/// next process start, until [`sign_out`](AuthAdapter::sign_out) forgets it.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Resolves a previously persisted session, refreshing it if it expired.
    ///
    /// Returns `Ok(None)` when nothing usable is stored.
    async fn restore_session(&self) -> Result<Option<Session>, TodoError>;

    /// Registers a new account.
    ///
    /// Returns `Ok(None)` when the provider requires confirmation before
    /// issuing a session.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, TodoError>;

    /// Exchanges credentials for a session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, TodoError>;

    /// Exchanges the session's refresh token for a new session of the same user.
    async fn refresh(&self, session: &Session) -> Result<Session, TodoError>;

    /// Revokes the session remotely and forgets any persisted copy.
    async fn sign_out(&self, session: &Session) -> Result<(), TodoError>;
}
