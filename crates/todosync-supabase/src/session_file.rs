// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk session persistence.
//!
//! The session is stored as JSON so a restarted process can resolve it
//! before reporting "signed out". On Unix the file is created with mode
//! `0600`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use todosync_core::{Session, TodoError, UserId};
use tracing::{debug, warn};

#[derive(Serialize, Deserialize)]
struct StoredSession {
    user_id: String,
    #[serde(default)]
    email: Option<String>,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id.0.clone(),
            email: session.email.clone(),
            access_token: session.access_token.expose_secret().to_string(),
            refresh_token: session
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            expires_at: session.expires_at,
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Session {
            user_id: UserId(stored.user_id),
            email: stored.email,
            access_token: SecretString::from(stored.access_token),
            refresh_token: stored.refresh_token.map(SecretString::from),
            expires_at: stored.expires_at,
        }
    }
}

fn storage_error(e: impl std::error::Error + Send + Sync + 'static) -> TodoError {
    TodoError::Storage { source: Box::new(e) }
}

/// A JSON file holding at most one session.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session. A missing file is `None`; an unreadable
    /// one is logged, removed and treated as missing.
    pub async fn load(&self) -> Result<Option<Session>, TodoError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(e)),
        };
        match serde_json::from_str::<StoredSession>(&content) {
            Ok(stored) => {
                debug!(path = %self.path.display(), "loaded persisted session");
                Ok(Some(stored.into()))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt session file");
                self.clear().await?;
                Ok(None)
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<(), TodoError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
        }
        let json =
            serde_json::to_string_pretty(&StoredSession::from(session)).map_err(storage_error)?;
        tokio::fs::write(&self.path, json).await.map_err(storage_error)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(storage_error)?;
        }
        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), TodoError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            user_id: UserId::from("u1"),
            email: Some("a@example.com".into()),
            access_token: SecretString::from("at"),
            refresh_token: Some(SecretString::from("rt")),
            expires_at: DateTime::from_timestamp(1_800_000_000, 0),
        }
    }

    #[tokio::test]
    async fn save_then_load_restores_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));
        file.save(&session()).await.unwrap();

        let loaded = file.load().await.unwrap().unwrap();
        assert_eq!(loaded.user_id, UserId::from("u1"));
        assert_eq!(loaded.access_token.expose_secret(), "at");
        assert_eq!(loaded.expires_at, session().expires_at);
    }

    #[tokio::test]
    async fn missing_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        assert!(file.load().await.unwrap().is_none());
        file.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let file = SessionFile::new(&path);
        assert!(file.load().await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        file.save(&session()).await.unwrap();
        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
