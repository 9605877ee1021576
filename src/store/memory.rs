//! In-memory session store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::record::SessionRecord;
use super::{SessionStore, StoreError};
use crate::session::SessionId;

/// Keeps session documents in a process-local map.
///
/// Nothing survives a restart; intended for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<SessionId, SessionRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    #[instrument(skip(self, record), fields(session_id = %record.snapshot().session_id()))]
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        records.insert(*record.snapshot().session_id(), record.clone());
        debug!("Session document saved");
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id))]
    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        let record = records.get(id).cloned();
        if record.is_none() {
            debug!("Session document not found");
        }
        Ok(record)
    }
}
