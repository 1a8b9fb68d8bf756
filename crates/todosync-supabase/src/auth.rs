// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auth adapter for the hosted `/auth/v1` API.
//!
//! Sign-up, password grant, refresh token grant and logout. Every session
//! it issues is written to the optional [`SessionFile`]; sign-out removes
//! it whether or not the remote logout succeeds.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use secrecy::ExposeSecret;
use todosync_core::{
    AdapterType, AuthAdapter, Credentials, HealthStatus, PluginAdapter, Session, TodoError,
};
use tracing::{debug, info, warn};

use crate::client::SupabaseClient;
use crate::session_file::SessionFile;
use crate::types::{PasswordRequest, RefreshRequest, SignUpResponse, TokenResponse};

/// Authentication against the hosted project.
pub struct SupabaseAuth {
    client: SupabaseClient,
    session_file: Option<SessionFile>,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient, session_file: Option<SessionFile>) -> Self {
        Self {
            client,
            session_file,
        }
    }

    async fn persist(&self, session: &Session) {
        if let Some(file) = &self.session_file
            && let Err(e) = file.save(session).await
        {
            warn!(error = %e, "failed to persist session");
        }
    }

    async fn forget(&self) {
        if let Some(file) = &self.session_file
            && let Err(e) = file.clear().await
        {
            warn!(error = %e, "failed to remove persisted session");
        }
    }

    async fn token_grant<B: serde::Serialize>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<Session, TodoError> {
        let mut url = self.client.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let token: TokenResponse = self
            .client
            .send_json(self.client.request(Method::POST, url, None).json(body))
            .await
            .map_err(TodoError::into_auth)?;
        Ok(token.into_session(Utc::now()))
    }
}

#[async_trait]
impl PluginAdapter for SupabaseAuth {
    fn name(&self) -> &str {
        "supabase-auth"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, TodoError> {
        let url = self.client.auth_url("health")?;
        match self.client.send(self.client.request(Method::GET, url, None)).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl AuthAdapter for SupabaseAuth {
    async fn restore_session(&self) -> Result<Option<Session>, TodoError> {
        let Some(file) = &self.session_file else {
            return Ok(None);
        };
        let Some(session) = file.load().await? else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }
        info!(user = %session.user_id, "persisted session expired, refreshing");
        match self.refresh(&session).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(e) => {
                warn!(error = %e, "could not refresh persisted session, discarding it");
                self.forget().await;
                Ok(None)
            }
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, TodoError> {
        let url = self.client.auth_url("signup")?;
        let body = PasswordRequest {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        };
        let response: SignUpResponse = self
            .client
            .send_json(self.client.request(Method::POST, url, None).json(&body))
            .await
            .map_err(TodoError::into_auth)?;
        match response {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                self.persist(&session).await;
                Ok(Some(session))
            }
            SignUpResponse::Pending(user) => {
                debug!(user = %user.id, "sign-up awaiting confirmation");
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, TodoError> {
        let body = PasswordRequest {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        };
        let session = self.token_grant("password", &body).await?;
        self.persist(&session).await;
        Ok(session)
    }

    async fn refresh(&self, session: &Session) -> Result<Session, TodoError> {
        let refresh_token = session
            .refresh_token
            .as_ref()
            .ok_or_else(|| TodoError::auth("session has no refresh token"))?;
        let body = RefreshRequest {
            refresh_token: refresh_token.expose_secret(),
        };
        let refreshed = self.token_grant("refresh_token", &body).await?;
        self.persist(&refreshed).await;
        Ok(refreshed)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), TodoError> {
        self.forget().await;
        let url = self.client.auth_url("logout")?;
        self.client
            .send(self.client.request(Method::POST, url, Some(&session.access_token)))
            .await
            .map_err(TodoError::into_auth)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::time::Duration;
    use todosync_core::UserId;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth(server: &MockServer, file: Option<SessionFile>) -> SupabaseAuth {
        let client =
            SupabaseClient::new(&server.uri(), SecretString::from("anon"), Duration::from_secs(5))
                .unwrap();
        SupabaseAuth::new(client, file)
    }

    fn token_body(user: &str, expires_in: i64) -> serde_json::Value {
        serde_json::json!({
            "access_token": format!("at-{user}"),
            "token_type": "bearer",
            "expires_in": expires_in,
            "refresh_token": format!("rt-{user}"),
            "user": {"id": user, "email": format!("{user}@example.com")}
        })
    }

    #[tokio::test]
    async fn sign_in_uses_password_grant_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_json(serde_json::json!({"email": "a@example.com", "password": "pw123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("u1", 3600)))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        let auth = auth(&server, Some(file.clone()));
        let session = auth
            .sign_in(&Credentials::new("a@example.com", "pw123456"))
            .await
            .unwrap();
        assert_eq!(session.user_id, UserId::from("u1"));
        assert_eq!(file.load().await.unwrap().unwrap().user_id, UserId::from("u1"));
    }

    #[tokio::test]
    async fn bad_credentials_are_auth_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let err = auth(&server, None)
            .sign_in(&Credentials::new("a@example.com", "wrong"))
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("Invalid login credentials"));
    }

    #[tokio::test]
    async fn sign_up_pending_confirmation_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u2",
                "email": "b@example.com",
                "confirmation_sent_at": "2026-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let session = auth(&server, None)
            .sign_up(&Credentials::new("b@example.com", "pw123456"))
            .await
            .unwrap();
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn expired_persisted_session_is_refreshed_on_restore() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(serde_json::json!({"refresh_token": "old-rt"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("u1", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        file.save(&Session {
            user_id: UserId::from("u1"),
            email: None,
            access_token: SecretString::from("old-at"),
            refresh_token: Some(SecretString::from("old-rt")),
            expires_at: Some(Utc::now() - chrono::Duration::minutes(5)),
        })
        .await
        .unwrap();

        let restored = auth(&server, Some(file)).restore_session().await.unwrap().unwrap();
        assert_eq!(restored.access_token.expose_secret(), "at-u1");
        assert!(!restored.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn unrefreshable_session_is_discarded_on_restore() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token"
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let file = SessionFile::new(&path);
        file.save(&Session {
            user_id: UserId::from("u1"),
            email: None,
            access_token: SecretString::from("old-at"),
            refresh_token: Some(SecretString::from("old-rt")),
            expires_at: Some(Utc::now() - chrono::Duration::minutes(5)),
        })
        .await
        .unwrap();

        assert!(auth(&server, Some(file)).restore_session().await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn sign_out_forgets_locally_even_if_logout_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer at-u1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let file = SessionFile::new(&path);
        let session = Session {
            user_id: UserId::from("u1"),
            email: None,
            access_token: SecretString::from("at-u1"),
            refresh_token: None,
            expires_at: None,
        };
        file.save(&session).await.unwrap();

        let result = auth(&server, Some(file)).sign_out(&session).await;
        assert!(result.unwrap_err().is_auth());
        assert!(!path.exists());
    }
}
