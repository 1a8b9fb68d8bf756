// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory authentication provider for deterministic testing.
//!
//! `MockAuth` implements `AuthAdapter` over a table of registered accounts.
//! Issued sessions expire an hour after issue. A single failure can be
//! injected with [`MockAuth::fail_next`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

use todosync_core::{
    AdapterType, AuthAdapter, Credentials, HealthStatus, PluginAdapter, Session, TodoError, UserId,
};

const SESSION_LIFETIME_SECS: i64 = 3600;
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    password: String,
    user_id: UserId,
}

#[derive(Default)]
struct AuthInner {
    accounts: HashMap<String, Account>,
    persisted: Option<Session>,
    fail_next: Option<String>,
    issued: u64,
    refresh_calls: usize,
    sign_out_calls: usize,
    refresh_revoked: bool,
}

impl AuthInner {
    fn take_failure(&mut self) -> Result<(), TodoError> {
        match self.fail_next.take() {
            Some(message) => Err(TodoError::remote(Some(503), message)),
            None => Ok(()),
        }
    }

    fn issue(&mut self, email: &str, user_id: &UserId, lifetime: Duration) -> Session {
        self.issued += 1;
        Session {
            user_id: user_id.clone(),
            email: Some(email.to_string()),
            access_token: SecretString::from(format!("access-{}", uuid::Uuid::new_v4())),
            refresh_token: Some(SecretString::from(format!("refresh-{}", self.issued))),
            expires_at: Some(Utc::now() + lifetime),
        }
    }
}

/// A mock auth provider backed by an in-memory account table.
pub struct MockAuth {
    inner: Mutex<AuthInner>,
    requires_confirmation: bool,
}

impl MockAuth {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AuthInner::default()),
            requires_confirmation: false,
        }
    }

    /// Sign-up returns no session, as for a provider that confirms e-mail first.
    pub fn requiring_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    fn inner(&self) -> MutexGuard<'_, AuthInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds an account and returns its user id.
    pub fn register(&self, email: &str, password: &str) -> UserId {
        let user_id = UserId(format!("user-{}", email.split('@').next().unwrap_or(email)));
        self.inner().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user_id: user_id.clone(),
            },
        );
        user_id
    }

    pub fn user_id(&self, email: &str) -> Option<UserId> {
        self.inner().accounts.get(email).map(|a| a.user_id.clone())
    }

    /// Stores a fresh session for `email` as if left by a previous run.
    pub fn persist_session_for(&self, email: &str) {
        self.persist(email, Duration::seconds(SESSION_LIFETIME_SECS));
    }

    /// Stores a session for `email` that expired a minute ago.
    pub fn persist_expired_session_for(&self, email: &str) {
        self.persist(email, Duration::seconds(-60));
    }

    fn persist(&self, email: &str, lifetime: Duration) {
        let mut inner = self.inner();
        let Some(user_id) = inner.accounts.get(email).map(|a| a.user_id.clone()) else {
            return;
        };
        let session = inner.issue(email, &user_id, lifetime);
        inner.persisted = Some(session);
    }

    /// Makes the next call of any kind fail with a remote error.
    pub fn fail_next(&self, message: &str) {
        self.inner().fail_next = Some(message.to_string());
    }

    /// Every later refresh fails, as after a server-side logout.
    pub fn revoke_refresh_tokens(&self) {
        self.inner().refresh_revoked = true;
    }

    pub fn refresh_calls(&self) -> usize {
        self.inner().refresh_calls
    }

    pub fn sign_out_calls(&self) -> usize {
        self.inner().sign_out_calls
    }

    /// True if a session is stored for the next restore.
    pub fn has_persisted_session(&self) -> bool {
        self.inner().persisted.is_some()
    }
}

impl Default for MockAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockAuth {
    fn name(&self) -> &str {
        "mock-auth"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, TodoError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AuthAdapter for MockAuth {
    async fn restore_session(&self) -> Result<Option<Session>, TodoError> {
        let mut inner = self.inner();
        inner.take_failure()?;
        Ok(inner.persisted.clone())
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, TodoError> {
        {
            let mut inner = self.inner();
            inner.take_failure()?;
            if inner.accounts.contains_key(&credentials.email) {
                return Err(TodoError::auth("user already registered"));
            }
        }
        if credentials.password.expose_secret().len() < MIN_PASSWORD_LEN {
            return Err(TodoError::auth(format!(
                "password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let user_id = self.register(&credentials.email, credentials.password.expose_secret());
        if self.requires_confirmation {
            return Ok(None);
        }
        let mut inner = self.inner();
        let session = inner.issue(
            &credentials.email,
            &user_id,
            Duration::seconds(SESSION_LIFETIME_SECS),
        );
        inner.persisted = Some(session.clone());
        Ok(Some(session))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, TodoError> {
        let mut inner = self.inner();
        inner.take_failure()?;
        let user_id = match inner.accounts.get(&credentials.email) {
            Some(account) if account.password == credentials.password.expose_secret() => {
                account.user_id.clone()
            }
            _ => return Err(TodoError::auth("invalid login credentials")),
        };
        let session = inner.issue(
            &credentials.email,
            &user_id,
            Duration::seconds(SESSION_LIFETIME_SECS),
        );
        inner.persisted = Some(session.clone());
        Ok(session)
    }

    async fn refresh(&self, session: &Session) -> Result<Session, TodoError> {
        let mut inner = self.inner();
        inner.refresh_calls += 1;
        inner.take_failure()?;
        if inner.refresh_revoked {
            return Err(TodoError::auth("invalid refresh token"));
        }
        let email = inner
            .accounts
            .iter()
            .find(|(_, account)| account.user_id == session.user_id)
            .map(|(email, _)| email.clone())
            .ok_or_else(|| TodoError::auth("refresh token not found"))?;
        let refreshed = inner.issue(
            &email,
            &session.user_id,
            Duration::seconds(SESSION_LIFETIME_SECS),
        );
        inner.persisted = Some(refreshed.clone());
        Ok(refreshed)
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), TodoError> {
        let mut inner = self.inner();
        inner.sign_out_calls += 1;
        inner.persisted = None;
        inner.take_failure()
    }
}
