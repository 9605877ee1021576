//! Event fan-out to connected clients.
//!
//! The engine publishes two event kinds: full-snapshot session updates to
//! every connection subscribed to that session, and rejection notices
//! scoped to the offending player's connections. Delivery uses unbounded
//! channel sends that never block, so publishing from inside a session's
//! critical section is safe and per-session event order matches the order
//! mutations were applied.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::error::GameError;
use crate::session::{PlayerId, SessionId, SessionView};

/// Identifies one registered client connection.
pub type ConnectionId = u64;

/// Sending half a transport hands over when registering a connection.
pub type EventSender = mpsc::UnboundedSender<GameEvent>;

/// Events delivered to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    /// Full post-mutation snapshot of a session.
    #[serde(rename_all = "camelCase")]
    GameUpdate {
        /// Session the snapshot belongs to.
        session_id: SessionId,
        /// The snapshot itself.
        snapshot: SessionView,
    },
    /// A rejected operation, delivered only to the offending player.
    #[serde(rename_all = "camelCase")]
    GameError {
        /// Player whose request was rejected.
        player_id: PlayerId,
        /// Stable machine tag for the rejection.
        code: String,
        /// Human-readable explanation.
        reason: String,
    },
}

#[derive(Debug)]
struct Connection {
    player: PlayerId,
    sender: EventSender,
    session: Option<SessionId>,
}

#[derive(Debug, Default)]
struct Inner {
    next_connection: ConnectionId,
    connections: HashMap<ConnectionId, Connection>,
    subscribers: HashMap<SessionId, HashSet<ConnectionId>>,
}

/// Routes session updates and player-scoped errors to live connections.
///
/// All methods are synchronous and non-blocking, so the engine can call
/// them while holding a session lock without stalling other sessions on a
/// slow consumer.
#[derive(Debug, Default)]
pub struct Broadcaster {
    inner: Mutex<Inner>,
}

impl Broadcaster {
    /// Creates a broadcaster with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection for `player`, returning its id.
    #[instrument(skip(self, sender), fields(player_id = %player))]
    pub fn register(&self, player: PlayerId, sender: EventSender) -> ConnectionId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_connection;
        inner.next_connection += 1;
        inner.connections.insert(
            id,
            Connection {
                player,
                sender,
                session: None,
            },
        );
        info!(connection_id = id, "Connection registered");
        id
    }

    /// Drops a connection and revokes its subscription.
    #[instrument(skip(self))]
    pub fn deregister(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.lock().unwrap();
        let Some(connection) = inner.connections.remove(&connection_id) else {
            debug!("Deregister for unknown connection");
            return;
        };
        if let Some(session_id) = connection.session {
            remove_subscriber(&mut inner, &session_id, connection_id);
        }
        info!(player_id = %connection.player, "Connection deregistered");
    }

    /// Points `connection_id` at `session_id`, replacing any previous
    /// subscription. A connection follows at most one session at a time.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub fn subscribe(&self, connection_id: ConnectionId, session_id: SessionId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.connections.contains_key(&connection_id) {
            warn!(connection_id, "Subscribe from unknown connection");
            return false;
        }
        if let Some(previous) = inner
            .connections
            .get_mut(&connection_id)
            .and_then(|connection| connection.session.replace(session_id))
        {
            remove_subscriber(&mut inner, &previous, connection_id);
        }
        inner
            .subscribers
            .entry(session_id)
            .or_default()
            .insert(connection_id);
        debug!(connection_id, "Connection subscribed to session");
        true
    }

    /// Clears `connection_id`'s subscription, keeping the connection open.
    #[instrument(skip(self))]
    pub fn unsubscribe(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(session_id) = inner
            .connections
            .get_mut(&connection_id)
            .and_then(|connection| connection.session.take())
        {
            remove_subscriber(&mut inner, &session_id, connection_id);
            debug!(connection_id, session_id = %session_id, "Connection unsubscribed");
        }
    }

    /// Number of connections following `session_id`.
    pub fn subscriber_count(&self, session_id: &SessionId) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .subscribers
            .get(session_id)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    /// Sends a full-snapshot update to every subscriber of the snapshot's
    /// session.
    #[instrument(skip(self, snapshot), fields(session_id = %snapshot.session_id()))]
    pub fn publish_update(&self, snapshot: &SessionView) {
        let inner = self.inner.lock().unwrap();
        let Some(subscribers) = inner.subscribers.get(snapshot.session_id()) else {
            debug!("No subscribers for session update");
            return;
        };
        let event = GameEvent::GameUpdate {
            session_id: *snapshot.session_id(),
            snapshot: snapshot.clone(),
        };
        let mut delivered = 0;
        for connection_id in subscribers {
            if let Some(connection) = inner.connections.get(connection_id) {
                if connection.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    debug!(connection_id, "Skipping closed connection");
                }
            }
        }
        debug!(delivered, "Session update published");
    }

    /// Sends a rejection notice to every connection `player` holds.
    ///
    /// Other players and spectators never see it.
    #[instrument(skip(self, error), fields(player_id = %player, code = error.code()))]
    pub fn notify_error(&self, player: &PlayerId, error: &GameError) {
        let inner = self.inner.lock().unwrap();
        let event = GameEvent::GameError {
            player_id: player.clone(),
            code: error.code().to_string(),
            reason: error.to_string(),
        };
        let mut delivered = 0;
        for (connection_id, connection) in &inner.connections {
            if connection.player != *player {
                continue;
            }
            if connection.sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(connection_id, "Skipping closed connection");
            }
        }
        debug!(delivered, "Error notice published");
    }
}

fn remove_subscriber(inner: &mut Inner, session_id: &SessionId, connection_id: ConnectionId) {
    if let Some(subscribers) = inner.subscribers.get_mut(session_id) {
        subscribers.remove(&connection_id);
        if subscribers.is_empty() {
            inner.subscribers.remove(session_id);
        }
    }
}
