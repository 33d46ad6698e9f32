use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use smartlab_api::models::Id;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// What a mutating action works on. Two actions on the same key never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKey {
    Device(Id),
    Logs,
}

impl Display for ActionKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ActionKey::Device(id) => write!(f, "device {}", id),
            ActionKey::Logs => write!(f, "usage logs"),
        }
    }
}

#[derive(Clone, Default)]
pub struct InFlight {
    actions: Arc<Mutex<HashMap<ActionKey, CancellationToken>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key`, or fails with `Busy` while another action holds it.
    pub fn try_begin(&self, key: ActionKey) -> Result<InFlightGuard> {
        let mut actions = self.actions.lock();
        if actions.contains_key(&key) {
            return Err(Error::busy(key.to_string()));
        }

        let token = CancellationToken::new();
        actions.insert(key, token.clone());

        Ok(InFlightGuard {
            key,
            token,
            actions: self.actions.clone(),
        })
    }

    pub async fn run<T, F>(&self, key: ActionKey, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.try_begin(key)?.run(fut).await
    }

    pub fn is_busy(&self, key: ActionKey) -> bool {
        self.actions.lock().contains_key(&key)
    }

    /// Returns whether an action was outstanding.
    pub fn cancel(&self, key: ActionKey) -> bool {
        match self.actions.lock().get(&key) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Releases its key when dropped.
pub struct InFlightGuard {
    key: ActionKey,
    token: CancellationToken,
    actions: Arc<Mutex<HashMap<ActionKey, CancellationToken>>>,
}

impl InFlightGuard {
    /// Drives `fut` until it finishes or the key is cancelled. A cancelled
    /// future is dropped, which aborts its outstanding request.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            result = fut => result,
            _ = self.token.cancelled() => {
                tracing::info!(key = %self.key, "action cancelled");
                Err(Error::cancelled(self.key.to_string()))
            }
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.actions.lock().remove(&self.key);
    }
}
