//! The logged-in admin session and its on-disk persistence.
//!
//! A session is created by a successful login, handed to the
//! [`ApiClient`](crate::ApiClient), saved so the panel survives a restart,
//! and destroyed on logout. There is no process-wide token.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    /// Session for a freshly issued token valid for `expires_in_secs`.
    pub fn new(token: impl Into<String>, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// JSON file holding at most one session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session. A missing file, an unreadable file or an
    /// expired token all yield `None`; the latter two also clear the file.
    pub async fn restore(&self, now: DateTime<Utc>) -> Option<AdminSession> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cannot read saved session");
                return None;
            }
        };

        match serde_json::from_slice::<AdminSession>(&bytes) {
            Ok(session) if !session.is_expired(now) => return Some(session),
            Ok(_) => tracing::info!("Saved admin session has expired"),
            Err(e) => tracing::warn!(error = %e, "Discarding malformed saved session"),
        }
        if let Err(e) = self.clear().await {
            tracing::warn!(error = %e, "Cannot remove stale session file");
        }
        None
    }

    pub async fn save(&self, session: &AdminSession) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Session(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(session).map_err(|e| ClientError::Session(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| ClientError::Session(e.to_string()))
    }

    /// Remove the saved session. Missing files are fine.
    pub async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Session(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("panel").join("session.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn save_then_restore() {
        let (_dir, store) = store();
        let now = Utc::now();
        let session = AdminSession::new("tok", 3600, now);

        store.save(&session).await.unwrap();
        assert_eq!(store.restore(now).await, Some(session));
    }

    #[tokio::test]
    async fn expired_session_is_dropped_and_cleared() {
        let (_dir, store) = store();
        let now = Utc::now();
        store.save(&AdminSession::new("tok", 60, now)).await.unwrap();

        let later = now + Duration::minutes(2);
        assert_eq!(store.restore(later).await, None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn malformed_or_missing_file_restores_nothing() {
        let (_dir, store) = store();
        assert_eq!(store.restore(Utc::now()).await, None);

        tokio::fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(store.path(), b"not json").await.unwrap();
        assert_eq!(store.restore(Utc::now()).await, None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (_dir, store) = store();
        store.clear().await.unwrap();
        store.save(&AdminSession::new("tok", 60, Utc::now())).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
    }
}
