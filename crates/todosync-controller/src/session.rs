// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle manager.
//!
//! Owns the single current session and publishes every change through a
//! [`watch`] channel:
//!
//! ```text
//! Loading ──restore──▶ Authenticated | Unauthenticated
//! Unauthenticated ──sign in──▶ Authenticated
//! Authenticated ──sign out / expiry──▶ Unauthenticated
//! Authenticated ──refresh (same user)──▶ Authenticated
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use todosync_core::{AuthAdapter, AuthState, Credentials, Session, TodoError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How long before expiry a session is refreshed, unless configured otherwise.
const DEFAULT_REFRESH_MARGIN_SECS: i64 = 60;

/// Owns the current authentication session.
pub struct SessionManager {
    auth: Arc<dyn AuthAdapter>,
    state: watch::Sender<AuthState>,
    refresh_margin: chrono::Duration,
}

impl SessionManager {
    /// Creates a manager in the [`AuthState::Loading`] state.
    ///
    /// Call [`restore`](Self::restore) to resolve a persisted session.
    pub fn new(auth: Arc<dyn AuthAdapter>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            auth,
            state,
            refresh_margin: chrono::Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
        }
    }

    /// Sets how close to expiry [`check_expiry`](Self::check_expiry) refreshes.
    pub fn with_refresh_margin(mut self, margin: std::time::Duration) -> Self {
        self.refresh_margin = chrono::Duration::from_std(margin)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS));
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// The active session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Subscribes to state changes. The receiver observes each transition as
    /// soon as it is published.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Resolves a previously persisted session, leaving the `Loading` state.
    ///
    /// A failing provider resolves to `Unauthenticated` and the error is returned.
    pub async fn restore(&self) -> Result<AuthState, TodoError> {
        match self.auth.restore_session().await {
            Ok(Some(session)) => {
                info!(user = %session.user_id, "restored persisted session");
                self.transition(AuthState::Authenticated(session));
            }
            Ok(None) => {
                debug!("no persisted session");
                self.transition(AuthState::Unauthenticated);
            }
            Err(e) => {
                warn!(error = %e, "session restore failed");
                self.transition(AuthState::Unauthenticated);
                return Err(e.into_auth());
            }
        }
        Ok(self.state())
    }

    /// Registers an account. A returned session becomes the current one.
    ///
    /// On failure the current state is left untouched.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, TodoError> {
        let session = self
            .auth
            .sign_up(credentials)
            .await
            .map_err(TodoError::into_auth)?;
        match &session {
            Some(session) => {
                info!(user = %session.user_id, "signed up");
                self.transition(AuthState::Authenticated(session.clone()));
            }
            None => info!(email = %credentials.email, "signed up, confirmation pending"),
        }
        Ok(session)
    }

    /// Signs in. On failure the current state is left untouched.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, TodoError> {
        let session = self
            .auth
            .sign_in(credentials)
            .await
            .map_err(TodoError::into_auth)?;
        info!(user = %session.user_id, "signed in");
        self.transition(AuthState::Authenticated(session.clone()));
        Ok(session)
    }

    /// Signs out. The local session is always cleared; a provider failure
    /// is returned afterwards.
    pub async fn sign_out(&self) -> Result<(), TodoError> {
        let remote = match self.current_session() {
            Some(session) => self.auth.sign_out(&session).await,
            None => Ok(()),
        };
        info!("signed out");
        self.transition(AuthState::Unauthenticated);
        remote.map_err(|e| {
            warn!(error = %e, "remote sign-out failed, local session cleared");
            e.into_auth()
        })
    }

    /// Exchanges the refresh token for a new session of the same user.
    ///
    /// A refresh that comes back for a different user is rejected and the
    /// session is dropped.
    pub async fn refresh(&self) -> Result<Session, TodoError> {
        let current = self
            .current_session()
            .ok_or_else(|| TodoError::auth("no active session to refresh"))?;
        let refreshed = self
            .auth
            .refresh(&current)
            .await
            .map_err(TodoError::into_auth)?;
        if refreshed.user_id != current.user_id {
            warn!(
                expected = %current.user_id,
                got = %refreshed.user_id,
                "refresh returned a different user"
            );
            self.transition(AuthState::Unauthenticated);
            return Err(TodoError::auth("refresh returned a session for another user"));
        }
        debug!(user = %refreshed.user_id, "session refreshed");
        self.transition(AuthState::Authenticated(refreshed.clone()));
        Ok(refreshed)
    }

    /// Refreshes a session that is about to expire.
    ///
    /// If the refresh fails the session is treated as externally expired and
    /// the state drops to `Unauthenticated`.
    pub async fn check_expiry(&self, now: DateTime<Utc>) -> Result<(), TodoError> {
        let Some(session) = self.current_session() else {
            return Ok(());
        };
        if !session.expires_within(now, self.refresh_margin) {
            return Ok(());
        }
        match self.refresh().await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(user = %session.user_id, error = %e, "session expired");
                self.expire();
                Err(e)
            }
        }
    }

    /// Drops the current session because the provider no longer honors it.
    pub fn expire(&self) {
        if self.state.borrow().session().is_some() {
            info!("session expired");
            self.transition(AuthState::Unauthenticated);
        }
    }

    fn transition(&self, next: AuthState) {
        let to = next.to_string();
        let previous = self.state.send_replace(next);
        debug!(from = %previous, to = %to, "auth state transition");
    }
}
