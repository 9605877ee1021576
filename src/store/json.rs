//! JSON-file session store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, instrument};

use super::record::SessionRecord;
use super::{SessionStore, StoreError};
use crate::session::SessionId;

/// Persists each session as one pretty-printed JSON document under a
/// directory, named `<session-id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory cannot be created.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::new(format!("Failed to create '{}': {}", dir.display(), e)))?;
        info!("Opened JSON session store");
        Ok(Self { dir })
    }

    fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    #[instrument(skip(self, record), fields(session_id = %record.snapshot().session_id()))]
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let path = self.path_for(record.snapshot().session_id());
        let json = serde_json::to_vec_pretty(record)?;
        fs::write(&path, json).await?;
        debug!(path = %path.display(), "Session document written");
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let path = self.path_for(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Session document not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), "Session document read");
        Ok(Some(record))
    }
}
