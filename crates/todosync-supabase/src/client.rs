// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client shared by the auth and table adapters.
//!
//! Provides [`SupabaseClient`], which carries the project URL and the public
//! `apikey` header, builds endpoint URLs, and turns non-success responses
//! into [`TodoError::Remote`]. Requests are never retried.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use todosync_core::TodoError;
use tracing::debug;

use crate::types::ApiError;

/// HTTP client for one hosted project.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
}

impl SupabaseClient {
    /// Creates a client for the project at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - Project URL, e.g. `https://xyz.supabase.co`
    /// * `anon_key` - Public API key sent as `apikey` on every request
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, anon_key: SecretString, timeout: Duration) -> Result<Self, TodoError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TodoError::Config(format!("invalid remote url {base_url:?}: {e}")))?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(anon_key.expose_secret())
            .map_err(|e| TodoError::Config(format!("invalid anon key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("apikey", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TodoError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            anon_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/auth/v1/{path}`.
    pub fn auth_url(&self, path: &str) -> Result<Url, TodoError> {
        self.join(&format!("auth/v1/{path}"))
    }

    /// `{base}/rest/v1/{table}`.
    pub fn rest_url(&self, table: &str) -> Result<Url, TodoError> {
        self.join(&format!("rest/v1/{table}"))
    }

    fn join(&self, path: &str) -> Result<Url, TodoError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
            .map_err(|e| TodoError::Config(format!("invalid endpoint path {path:?}: {e}")))
    }

    /// Starts a request authorized with `token`, or with the anon key when
    /// no user token is given.
    pub fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        token: Option<&SecretString>,
    ) -> RequestBuilder {
        let bearer = token.unwrap_or(&self.anon_key).expose_secret();
        self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Sends the request and returns the response if it succeeded.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, TodoError> {
        let response = request.send().await.map_err(|e| {
            TodoError::remote(e.status().map(|s| s.as_u16()), format!("HTTP request failed: {e}"))
        })?;

        let status = response.status();
        debug!(status = %status, url = %response.url().path(), "response received");
        if status.is_success() {
            return Ok(response);
        }
        Err(error_from_response(status, response).await)
    }

    /// Sends the request and decodes a JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TodoError> {
        let response = self.send(request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| TodoError::remote(None, format!("failed to read response body: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| TodoError::remote(None, format!("failed to parse response: {e}")))
    }
}

async fn error_from_response(status: StatusCode, response: Response) -> TodoError {
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.summary())
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });
    TodoError::remote(Some(status.as_u16()), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> SupabaseClient {
        SupabaseClient::new(base, SecretString::from("anon-key"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let c = client("https://example.test/project");
        assert_eq!(
            c.auth_url("token").unwrap().as_str(),
            "https://example.test/project/auth/v1/token"
        );
        assert_eq!(
            c.rest_url("todos").unwrap().as_str(),
            "https://example.test/project/rest/v1/todos"
        );
    }

    #[test]
    fn bad_url_is_a_config_error() {
        let err = SupabaseClient::new("not a url", SecretString::from("k"), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, TodoError::Config(_)));
    }

    #[tokio::test]
    async fn sends_apikey_and_anon_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server.uri());
        let url = c.auth_url("health").unwrap();
        c.send(c.request(reqwest::Method::GET, url, None)).await.unwrap();
    }

    #[tokio::test]
    async fn error_body_becomes_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/todos"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": "PGRST301",
                "message": "JWT expired"
            })))
            .mount(&server)
            .await;

        let c = client(&server.uri());
        let url = c.rest_url("todos").unwrap();
        let err = c
            .send(c.request(reqwest::Method::GET, url, None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "remote error (401): JWT expired");
    }
}
