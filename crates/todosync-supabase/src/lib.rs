// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters for a hosted Supabase project.
//!
//! [`SupabaseAuth`] implements [`todosync_core::AuthAdapter`] against
//! `/auth/v1` and [`SupabaseStore`] implements [`todosync_core::TodoStore`]
//! against `/rest/v1`. Both share one [`SupabaseClient`].

pub mod auth;
pub mod client;
pub mod session_file;
pub mod store;
pub mod types;

pub use auth::SupabaseAuth;
pub use client::SupabaseClient;
pub use session_file::SessionFile;
pub use store::SupabaseStore;

use secrecy::SecretString;
use todosync_config::TodosyncConfig;
use todosync_core::TodoError;

/// Environment variable consulted when the configuration has no anon key.
pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Both adapters, built from one configuration.
pub struct Connection {
    pub auth: SupabaseAuth,
    pub store: SupabaseStore,
}

/// Builds the adapters described by `config`.
pub fn connect(config: &TodosyncConfig) -> Result<Connection, TodoError> {
    let anon_key = resolve_anon_key(config.remote.anon_key.as_deref())?;
    let client = SupabaseClient::new(&config.remote.url, anon_key, config.remote.timeout())?;
    let session_file = config.session.resolved_path().map(SessionFile::new);
    if session_file.is_none() {
        tracing::debug!("session persistence disabled");
    }
    Ok(Connection {
        auth: SupabaseAuth::new(client.clone(), session_file),
        store: SupabaseStore::new(client, config.remote.table.clone()),
    })
}

fn resolve_anon_key(configured: Option<&str>) -> Result<SecretString, TodoError> {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var(ANON_KEY_ENV).ok())
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            TodoError::Config(format!(
                "no anon key: set remote.anon_key or the {ANON_KEY_ENV} environment variable"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use todosync_core::PluginAdapter;

    #[test]
    fn configured_anon_key_wins() {
        let key = resolve_anon_key(Some("from-config")).unwrap();
        assert_eq!(key.expose_secret(), "from-config");
    }

    #[test]
    fn connect_with_configured_key() {
        let mut config = TodosyncConfig::default();
        config.remote.anon_key = Some("k".into());
        config.session.persist = false;
        let conn = connect(&config).unwrap();
        assert_eq!(conn.store.name(), "supabase-store");
        assert_eq!(conn.auth.name(), "supabase-auth");
    }

    #[test]
    fn invalid_url_is_rejected() {
        let mut config = TodosyncConfig::default();
        config.remote.anon_key = Some("k".into());
        config.remote.url = "::nope".into();
        assert!(matches!(connect(&config), Err(TodoError::Config(_))));
    }
}
