use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use smartlab_api::models::{TokenPair, unknown_user};
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::error::{Error, Result};

/// Credentials of the logged-in user. Field names double as the storage keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>>;

    async fn save(&self, session: &Session) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Lives as long as the process, like a browser tab's session storage.
#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self.session.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.session.write().await = None;
        Ok(())
    }
}

/// Keeps the session in a JSON file so consecutive CLI invocations share it.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable session file: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, serde_json::to_vec_pretty(session)?).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// The only reader and writer of the credential pair. Cloning shares state.
#[derive(Clone)]
pub struct SessionHandle {
    store: Arc<dyn SessionStore>,
    current: Arc<RwLock<Option<Session>>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl SessionHandle {
    pub async fn load(store: Arc<dyn SessionStore>) -> Result<Self> {
        let current = store.load().await?;

        Ok(Self {
            store,
            current: Arc::new(RwLock::new(current)),
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Acting user for request bodies, `Unknown` without a session.
    pub async fn username(&self) -> String {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.username.clone())
            .unwrap_or_else(unknown_user)
    }

    pub async fn replace(&self, session: Session) -> Result<()> {
        self.store.save(&session).await?;
        *self.current.write().await = Some(session);
        Ok(())
    }

    /// Stores a rotated token pair, keeping the username.
    pub async fn rotate(&self, tokens: TokenPair) -> Result<Session> {
        let mut current = self.current.write().await;
        let username = current
            .as_ref()
            .map(|s| s.username.clone())
            .ok_or(Error::SessionExpired)?;

        let session = Session {
            username,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        };

        self.store.save(&session).await?;
        *current = Some(session.clone());

        Ok(session)
    }

    pub async fn clear(&self) -> Result<()> {
        *self.current.write().await = None;
        self.store.clear().await
    }

    /// Serialises token refreshes across every clone of this handle.
    pub async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_lock.try_lock().is_err()
    }
}
