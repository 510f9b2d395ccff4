//! Client-side authentication session.
//!
//! DESIGN
//! ======
//! A `Session` is constructed explicitly and handed to whatever needs the
//! signed-in user (the remote application client, the tracker). There is no
//! ambient global: `init` restores a persisted session, `establish` records a
//! new one, `teardown` clears it. Every change is published on a `watch`
//! channel so listeners always observe the latest value.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

/// An authenticated session as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Where a session survives process restarts.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load(&self) -> Result<Option<AuthSession>, SessionError>;
    async fn save(&self, session: &AuthSession) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

/// JSON file on disk.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> Result<Option<AuthSession>, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &AuthSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, mostly for tests.
#[derive(Default)]
pub struct MemorySessionStorage {
    slot: Mutex<Option<AuthSession>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: AuthSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> Result<Option<AuthSession>, SessionError> {
        Ok(self.slot.lock().map(|s| s.clone()).unwrap_or_default())
    }

    async fn save(&self, session: &AuthSession) -> Result<(), SessionError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}

/// Handle to the current session. Cloning shares the same state and listeners.
#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn SessionStorage>,
    current: Arc<watch::Sender<Option<AuthSession>>>,
}

impl Session {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            storage,
            current: Arc::new(tx),
        }
    }

    /// Restores a persisted session. An expired one is discarded and cleared from storage.
    pub async fn init(&self) -> Result<Option<AuthSession>, SessionError> {
        let restored = match self.storage.load().await? {
            Some(session) if session.is_expired(Utc::now()) => {
                info!("Persisted session for {} has expired", session.user.email);
                self.storage.clear().await?;
                None
            }
            other => other,
        };

        if let Some(session) = &restored {
            debug!("Restored session for {}", session.user.email);
        }
        self.current.send_replace(restored.clone());
        Ok(restored)
    }

    pub async fn establish(&self, session: AuthSession) -> Result<(), SessionError> {
        self.storage.save(&session).await?;
        info!("Signed in as {}", session.user.email);
        self.current.send_replace(Some(session));
        Ok(())
    }

    /// Clears the session everywhere and tells listeners. Listeners are notified even
    /// when storage fails, so the in-memory view never outlives a sign-out.
    pub async fn teardown(&self) -> Result<(), SessionError> {
        let cleared = self.storage.clear().await;
        if let Err(e) = &cleared {
            warn!("Failed to clear persisted session: {e}");
        }
        self.current.send_replace(None);
        cleared
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.current.borrow().clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.current.borrow().as_ref().map(|s| s.user.clone())
    }

    /// Bearer token for outbound requests, if signed in and not expired.
    pub fn access_token(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .filter(|s| !s.is_expired(Utc::now()))
            .map(|s| s.access_token.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.current.subscribe()
    }
}
