// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store backed by the hosted `/rest/v1` table API.
//!
//! Filters are expressed as query operators (`user_id=eq.…`, `text=ilike.…`
//! or `text=imatch.…`), the total is read from the `Content-Range` header of
//! a `Prefer: count=exact` read, and writes ask for `return=representation` so
//! the number of returned rows is the number of rows affected.

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, HeaderMap};
use reqwest::{Method, Url};
use todosync_core::{
    AdapterType, HealthStatus, NewTodo, PluginAdapter, ResultPage, Session, SortOrder, Todo,
    TodoError, TodoMatch, TodoPatch, TodoQuery, TodoStore,
};
use tracing::debug;

use crate::client::SupabaseClient;
use crate::types::TodoRow;

const PREFER: &str = "Prefer";

/// The todo table of a hosted project.
pub struct SupabaseStore {
    client: SupabaseClient,
    table: String,
}

impl SupabaseStore {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn scoped_url(&self, matching: &TodoMatch) -> Result<Url, TodoError> {
        let mut url = self.client.rest_url(&self.table)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", matching.id))
            .append_pair("user_id", &format!("eq.{}", matching.owner));
        Ok(url)
    }

    async fn rows(&self, request: reqwest::RequestBuilder) -> Result<Vec<TodoRow>, TodoError> {
        self.client.send_json(request).await
    }
}

/// Builds the read URL for `query`.
pub(crate) fn query_url(mut url: Url, query: &TodoQuery) -> Url {
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{}", query.owner));
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.append_pair("text", &text_filter(search));
        }
        if let Some(completed) = query.completed {
            pairs.append_pair("completed", &format!("eq.{completed}"));
        }
        let order = match query.order {
            SortOrder::CreatedAtDesc => "created_at.desc,id.desc",
            SortOrder::IdDesc => "id.desc",
        };
        pairs
            .append_pair("order", order)
            .append_pair("offset", &query.offset.to_string())
            .append_pair("limit", &query.limit.to_string());
    }
    url
}

/// Case-insensitive substring filter on `text`.
///
/// The table API rewrites every `*` in a like pattern to `%` and has no
/// escape for it, so a term containing `*` is sent as an escaped regex
/// (`imatch`) instead.
pub(crate) fn text_filter(search: &str) -> String {
    if search.contains('*') {
        format!("imatch.{}", escape_regex(search))
    } else {
        format!("ilike.*{}*", escape_like(search))
    }
}

/// Backslash before ASCII punctuation is always a literal in a Postgres regex.
pub(crate) fn escape_regex(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if c.is_ascii_punctuation() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escapes the pattern metacharacters of `ilike` so the term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reads the total from `Content-Range: 0-9/25` or `*/0`.
pub(crate) fn total_from_headers(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl PluginAdapter for SupabaseStore {
    fn name(&self) -> &str {
        "supabase-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, TodoError> {
        let mut url = self.client.rest_url(&self.table)?;
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("limit", "0");
        match self.client.send(self.client.request(Method::GET, url, None)).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(TodoError::Remote {
                status: Some(401 | 403),
                message,
            }) => Ok(HealthStatus::Degraded(format!(
                "table reachable but anonymous access denied: {message}"
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl TodoStore for SupabaseStore {
    async fn scoped_query(
        &self,
        auth: &Session,
        query: &TodoQuery,
    ) -> Result<ResultPage, TodoError> {
        let url = query_url(self.client.rest_url(&self.table)?, query);
        let request = self
            .client
            .request(Method::GET, url, Some(&auth.access_token))
            .header(PREFER, "count=exact");
        let response = self.client.send(request).await?;
        let total = total_from_headers(response.headers());
        let rows: Vec<TodoRow> = response
            .json()
            .await
            .map_err(|e| TodoError::remote(None, format!("failed to parse rows: {e}")))?;
        let items: Vec<Todo> = rows.into_iter().map(Todo::from).collect();
        let total_count = total.unwrap_or_else(|| (query.offset + items.len()) as u64);
        debug!(rows = items.len(), total_count, "scoped query answered");
        Ok(ResultPage { items, total_count })
    }

    async fn insert(&self, auth: &Session, record: &NewTodo) -> Result<Todo, TodoError> {
        let url = self.client.rest_url(&self.table)?;
        let request = self
            .client
            .request(Method::POST, url, Some(&auth.access_token))
            .header(PREFER, "return=representation")
            .json(record);
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .map(Todo::from)
            .ok_or_else(|| TodoError::remote(None, "insert returned no row"))
    }

    async fn update(
        &self,
        auth: &Session,
        patch: &TodoPatch,
        matching: &TodoMatch,
    ) -> Result<u64, TodoError> {
        let request = self
            .client
            .request(Method::PATCH, self.scoped_url(matching)?, Some(&auth.access_token))
            .header(PREFER, "return=representation")
            .json(patch);
        Ok(self.rows(request).await?.len() as u64)
    }

    async fn delete(&self, auth: &Session, matching: &TodoMatch) -> Result<u64, TodoError> {
        let request = self
            .client
            .request(Method::DELETE, self.scoped_url(matching)?, Some(&auth.access_token))
            .header(PREFER, "return=representation");
        Ok(self.rows(request).await?.len() as u64)
    }
}
