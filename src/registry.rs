//! Live-session registry with per-session exclusive access.
//!
//! Two locking levels keep sessions independent: an outer read/write lock
//! guards the id -> session map, and each session sits behind its own
//! mutex. The outer lock is only ever held long enough to resolve or edit
//! a map entry, so validating or applying a move in one session never
//! blocks traffic to any other session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument};

use crate::session::{Session, SessionId, SessionView};

/// Shared handle to one live session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Holds every live session and serializes access per session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `session` to the registry and returns its handle.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn insert(&self, session: Session) -> SessionHandle {
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        debug!("Session registered");
        handle
    }

    /// Resolves the handle for `id`, if the session is live.
    pub async fn handle(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Runs `f` with exclusive access to the session `id`.
    ///
    /// The map lock is released before the session lock is taken, so `f`
    /// only serializes callers touching this one session. Returns `None`
    /// when the session is not live.
    pub async fn with_session<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        Some(f(&mut session))
    }

    /// Snapshots every live session.
    ///
    /// Each session is locked just long enough to copy its view, so the
    /// result is a consistent picture per session but not across sessions.
    pub async fn views(&self) -> Vec<SessionView> {
        let handles: Vec<SessionHandle> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };
        let mut views = Vec::with_capacity(handles.len());
        for handle in handles {
            views.push(handle.lock().await.view());
        }
        views
    }

    /// Removes `id` from the registry, returning its handle if it was live.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            debug!("Session removed from registry");
        }
        removed
    }

    /// Empties the registry, returning every handle that was live.
    pub async fn drain(&self) -> Vec<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        sessions.drain().map(|(_, handle)| handle).collect()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the registry holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
