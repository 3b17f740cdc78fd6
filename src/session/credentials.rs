use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::warn;

use crate::models::Manager;
use crate::util::state::{self, ReadWriteError};

/// The persisted session record: one bearer token plus the
/// authenticated principal, stored together and cleared together.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub manager: Manager,
}

/// Process-wide owner of the stored credential.
///
/// The session manager is the only writer on the login/logout path; the
/// transport layer additionally clears the store when the backend
/// reports the credential invalid.
pub struct CredentialStore {
    slot: RwLock<Option<Credentials>>,
    path: PathBuf,
}

impl CredentialStore {
    pub fn open(state_dir: &Path) -> Self {
        Self {
            slot: RwLock::new(None),
            path: state_dir.join("session.json"),
        }
    }

    /// Load the persisted record into memory, returning it if present.
    pub async fn load(&self) -> Result<Option<Credentials>, ReadWriteError> {
        let stored: Option<Credentials> = state::read(&self.path).await?;
        let mut slot = self.slot.write().await;
        slot.clone_from(&stored);
        Ok(stored)
    }

    pub async fn token(&self) -> Option<String> {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|credentials| credentials.token.clone())
    }

    pub async fn manager(&self) -> Option<Manager> {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|credentials| credentials.manager.clone())
    }

    /// Persist a new credential and make it current.
    pub async fn store(&self, credentials: Credentials) -> Result<(), ReadWriteError> {
        state::store(&self.path, &credentials).await?;
        *self.slot.write().await = Some(credentials);
        Ok(())
    }

    /// Drop the credential from memory and disk. A failure to remove
    /// the record is logged rather than propagated: the in-memory slot
    /// is gone either way and a stale record fails verification on the
    /// next start.
    pub async fn clear(&self) {
        *self.slot.write().await = None;
        if let Err(err) = state::remove(&self.path).await {
            warn!("failed to remove stored session: {err}");
        }
    }
}
