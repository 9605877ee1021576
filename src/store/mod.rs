//! Session persistence.
//!
//! The engine saves a [`SessionRecord`] when a session is created and again
//! when it reaches `OVER`; gameplay itself never touches the store. The
//! [`SessionStore`] contract keeps the backend swappable: an in-memory map
//! for tests and a one-file-per-session JSON store ship here, and anything
//! else (a database, an object store) can slot in behind the same trait.

mod error;
mod json;
mod memory;
mod record;

pub use error::StoreError;
pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use record::SessionRecord;

use async_trait::async_trait;

use crate::session::SessionId;

/// Save/load contract for session documents.
#[async_trait]
pub trait SessionStore: std::fmt::Debug + Send + Sync {
    /// Writes `record`, replacing any previous document for the session.
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Reads the document for `id`, or `None` if never saved.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError>;
}
