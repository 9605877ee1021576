//! Persisted session document.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionView};

/// Durable form of a session: its full snapshot plus timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Snapshot at the moment of saving.
    #[serde(flatten)]
    snapshot: SessionView,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session reached `OVER`, if it did before saving.
    finished_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Captures `session` as a durable document.
    pub fn from_session(session: &Session) -> Self {
        Self {
            snapshot: session.view(),
            created_at: session.created_at(),
            finished_at: session.finished_at(),
        }
    }
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self::from_session(session)
    }
}
