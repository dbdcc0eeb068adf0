use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::entities::{ProfileCache, UserRole};
use crate::domain::ports::{Clock, SessionStore};

// System clock adapter used outside tests.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

// Durable session document. The serialized field names double as the
// storage keys consumed during rehydration and by the embedding UI.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_valid_status: Option<bool>,
}

impl PersistedSession {
    fn apply_cache(&mut self, cache: &ProfileCache) {
        self.user_name = Some(cache.user_name.clone());
        self.user_role = Some(cache.user_role);
        self.has_valid_status = Some(cache.has_valid_status);
    }
}

// In-memory store adapter for embedding contexts without durable storage.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    fields: Arc<Mutex<PersistedSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn read_token(&self) -> Result<Option<String>, String> {
        Ok(self.fields.lock().await.token.clone())
    }

    async fn write_token(&self, token: &str) -> Result<(), String> {
        self.fields.lock().await.token = Some(token.to_string());
        Ok(())
    }

    async fn write_profile_cache(&self, cache: &ProfileCache) -> Result<(), String> {
        self.fields.lock().await.apply_cache(cache);
        Ok(())
    }

    async fn clear(&self) -> Result<(), String> {
        *self.fields.lock().await = PersistedSession::default();
        Ok(())
    }
}

// File-backed store adapter persisting the session document as JSON at a
// caller-chosen path.
#[derive(Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<PersistedSession, String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| format!("corrupt session file: {err}")),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(PersistedSession::default())
            }
            Err(err) => Err(format!("failed to read session file: {err}")),
        }
    }

    async fn save(&self, fields: &PersistedSession) -> Result<(), String> {
        let bytes = serde_json::to_vec_pretty(fields)
            .map_err(|err| format!("failed to encode session file: {err}"))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|err| format!("failed to write session file: {err}"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn read_token(&self) -> Result<Option<String>, String> {
        Ok(self.load().await?.token)
    }

    async fn write_token(&self, token: &str) -> Result<(), String> {
        // A corrupt document is replaced rather than read.
        let mut fields = self.load().await.unwrap_or_default();
        fields.token = Some(token.to_string());
        self.save(&fields).await
    }

    async fn write_profile_cache(&self, cache: &ProfileCache) -> Result<(), String> {
        let mut fields = self.load().await.unwrap_or_default();
        fields.apply_cache(cache);
        self.save(&fields).await
    }

    async fn clear(&self) -> Result<(), String> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            // Clearing an already-empty store is a no-op.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(format!("failed to clear session file: {err}")),
        }
    }
}
