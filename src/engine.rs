//! Session lifecycle and move processing.
//!
//! [`SessionEngine`] is the single authoritative surface for matches: it
//! seats players, validates and applies moves under each session's
//! exclusive lock, publishes snapshot updates, and persists sessions at
//! creation and at their terminal state. Store traffic always happens
//! after the relevant lock is released, so a slow backend can never stall
//! gameplay.
//!
//! Seat membership (join, leave, create) is serialized engine-wide by a
//! dedicated guard; that keeps a reconnecting player from being seated
//! twice without ever putting move traffic for different sessions behind
//! a shared lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::broadcast::Broadcaster;
use crate::config::{EngineConfig, LeavePolicy};
use crate::error::GameError;
use crate::games::{GameRules, MovePayload, MoveViolation, NimRules, Variant};
use crate::registry::SessionRegistry;
use crate::session::{PlayerId, Session, SessionId, SessionStatus, SessionView};
use crate::store::{SessionRecord, SessionStore};

/// Server-authoritative engine for turn-based game sessions.
#[derive(Debug)]
pub struct SessionEngine {
    config: EngineConfig,
    rules: HashMap<Variant, Arc<dyn GameRules>>,
    registry: SessionRegistry,
    broadcaster: Broadcaster,
    store: Arc<dyn SessionStore>,
    membership: Mutex<()>,
}

impl SessionEngine {
    /// Creates an engine over `store` with the given settings.
    #[instrument(skip(config, store))]
    pub fn new(config: EngineConfig, store: Arc<dyn SessionStore>) -> Self {
        info!(
            leave_policy = %config.leave_policy(),
            retain_finished = *config.retain_finished(),
            "Creating session engine"
        );
        let rules = build_rules(&config);
        Self {
            config,
            rules,
            registry: SessionRegistry::new(),
            broadcaster: Broadcaster::new(),
            store,
            membership: Mutex::new(()),
        }
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Connection registry for transports to register and subscribe
    /// event consumers.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Number of sessions currently live in the registry.
    pub async fn session_count(&self) -> usize {
        self.registry.len().await
    }

    /// Seats `player` in a session of `variant`, preferring (in order)
    /// a session they already occupy, then any open session, then a
    /// freshly created one.
    ///
    /// A player already seated in a live session gets that session back
    /// unchanged, so reconnect retries cannot claim a second seat.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SessionUnavailable`] if no rules are
    /// registered for `variant`.
    #[instrument(skip(self), fields(variant = %variant, player_id = %player))]
    pub async fn join_or_create(
        &self,
        variant: Variant,
        player: PlayerId,
    ) -> Result<SessionView, GameError> {
        let rules = self.rules_for(variant)?;
        let guard = self.membership.lock().await;

        if let Some(existing) = self.find_seated(&player).await {
            info!(session_id = %existing.session_id(), "Player already seated, returning existing session");
            return Ok(existing);
        }

        if let Some(open) = self.find_open(variant).await {
            let session_id = *open.session_id();
            let seated = self
                .registry
                .with_session(&session_id, |session| {
                    let seat = session.seat_player(player.clone())?;
                    if session.is_full() {
                        session.start();
                    }
                    let view = session.view();
                    self.broadcaster.publish_update(&view);
                    Some((seat, view))
                })
                .await
                .flatten();
            if let Some((seat, view)) = seated {
                info!(session_id = %session_id, seat, "Joined open session");
                return Ok(view);
            }
            // The session vanished between the scan and the lock
            // (teardown); fall through and create a fresh one.
        }

        let session = Session::new(
            variant,
            rules.capacity(),
            rules.initial_state(),
            player.clone(),
        );
        let view = session.view();
        let record = SessionRecord::from_session(&session);
        self.registry.insert(session).await;
        self.broadcaster.publish_update(&view);
        drop(guard);

        self.persist(record).await;
        info!(session_id = %view.session_id(), "Created new session");
        Ok(view)
    }

    /// Seats `player` in the specific session `session_id`.
    ///
    /// A seated requester always gets the session back, whatever its
    /// status.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SessionUnavailable`] when the session is
    /// unknown, already full, or no longer waiting for players.
    #[instrument(skip(self), fields(session_id = %session_id, player_id = %player))]
    pub async fn join(
        &self,
        session_id: SessionId,
        player: PlayerId,
    ) -> Result<SessionView, GameError> {
        let _guard = self.membership.lock().await;
        let result = self
            .registry
            .with_session(&session_id, |session| {
                if session.is_seated(&player) {
                    debug!("Seated player rejoining");
                    return Ok(session.view());
                }
                if session.status() != SessionStatus::Waiting {
                    return Err(GameError::SessionUnavailable {
                        reason: format!("session {} is {}", session_id, session.status()),
                    });
                }
                match session.seat_player(player.clone()) {
                    Some(_) => {
                        if session.is_full() {
                            session.start();
                        }
                        let view = session.view();
                        self.broadcaster.publish_update(&view);
                        Ok(view)
                    }
                    None => Err(GameError::SessionUnavailable {
                        reason: format!("session {} has no open seat", session_id),
                    }),
                }
            })
            .await;
        result.unwrap_or_else(|| Err(unknown_session(&session_id)))
    }

    /// Handles a deliberate departure from `session_id`.
    ///
    /// Leaving a `WAITING` session opens the seat back up. Leaving an
    /// in-progress session follows the configured [`LeavePolicy`]: under
    /// `Detach` the seat stays reserved for a later rejoin, under
    /// `Forfeit` the game ends and the remaining players win. Leaving a
    /// finished session, or one the player never sat in, does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SessionUnavailable`] when the session is
    /// unknown.
    #[instrument(skip(self), fields(session_id = %session_id, player_id = %player))]
    pub async fn leave(&self, session_id: SessionId, player: PlayerId) -> Result<(), GameError> {
        let policy = *self.config.leave_policy();
        let _guard = self.membership.lock().await;
        let finished = self
            .registry
            .with_session(&session_id, |session| {
                let Some(seat) = session.seat_of(&player) else {
                    debug!("Leave from a player without a seat, nothing to do");
                    return None;
                };
                match session.status() {
                    SessionStatus::Waiting => {
                        session.vacate_seat(seat);
                        self.broadcaster.publish_update(&session.view());
                        None
                    }
                    SessionStatus::InProgress => match policy {
                        LeavePolicy::Detach => {
                            info!(seat, "Player detached, seat stays reserved");
                            None
                        }
                        LeavePolicy::Forfeit => {
                            let winners = session.seated_players_except(seat);
                            info!(seat, winners = ?winners, "Player forfeited");
                            session.finish(winners);
                            let view = session.view();
                            self.broadcaster.publish_update(&view);
                            Some(SessionRecord::from_session(session))
                        }
                    },
                    SessionStatus::Over => None,
                }
            })
            .await
            .ok_or_else(|| unknown_session(&session_id))?;
        drop(_guard);

        if let Some(record) = finished {
            self.persist_terminal(record).await;
        }
        Ok(())
    }

    /// Validates and applies one move, returning the post-move snapshot.
    ///
    /// On success every subscriber of the session receives the same
    /// snapshot as a `gameUpdate`. On rejection the offending player's
    /// connections receive a `gameError` and the session is untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`GameError`] describing the first rejected check.
    #[instrument(skip(self, payload), fields(session_id = %session_id, player_id = %player))]
    pub async fn submit_move(
        &self,
        session_id: SessionId,
        player: PlayerId,
        payload: MovePayload,
    ) -> Result<SessionView, GameError> {
        debug!(payload = ?payload, "Processing move submission");
        let result = self.apply_move(session_id, &player, payload).await;
        if let Err(ref err) = result {
            warn!(code = err.code(), error = %err, "Move rejected");
            self.broadcaster.notify_error(&player, err);
        }
        result
    }

    async fn apply_move(
        &self,
        session_id: SessionId,
        player: &PlayerId,
        payload: MovePayload,
    ) -> Result<SessionView, GameError> {
        let outcome = self
            .registry
            .with_session(&session_id, |session| {
                // Rejection precedence: turn, then payload legality, then
                // lifecycle status.
                let mover = session.current_mover();
                if mover != Some(player) {
                    return Err(GameError::NotYourTurn {
                        expected: mover.cloned(),
                    });
                }
                if payload.variant() != session.variant() {
                    return Err(GameError::from(MoveViolation::VariantMismatch));
                }
                let rules = self.rules_for(session.variant())?;
                rules.check_move(session.state(), &payload)?;
                if session.status() != SessionStatus::InProgress {
                    return Err(GameError::GameNotInProgress {
                        status: session.status(),
                    });
                }

                let seat = session.mover_seat();
                let next_state = rules.apply_move(session.state(), &payload);
                session.record_move(player.clone(), payload, next_state);

                let mut finished = None;
                if let Some(winner_seats) = rules.outcome(session.state(), seat) {
                    let winners = session.players_at(&winner_seats);
                    session.finish(winners);
                    finished = Some(SessionRecord::from_session(session));
                }

                let view = session.view();
                self.broadcaster.publish_update(&view);
                Ok((view, finished))
            })
            .await
            .ok_or_else(|| unknown_session(&session_id))?;
        let (view, finished) = outcome?;

        if let Some(record) = finished {
            self.persist_terminal(record).await;
        }
        Ok(view)
    }

    /// Snapshots of every `WAITING` session, optionally narrowed to one
    /// variant. The list is a point-in-time read and may already be stale
    /// when it returns.
    #[instrument(skip(self))]
    pub async fn list_open(&self, variant: Option<Variant>) -> Vec<SessionView> {
        let open: Vec<SessionView> = self
            .registry
            .views()
            .await
            .into_iter()
            .filter(|view| *view.status() == SessionStatus::Waiting)
            .filter(|view| variant.map_or(true, |wanted| *view.variant() == wanted))
            .collect();
        debug!(count = open.len(), "Listed open sessions");
        open
    }

    /// Current snapshot of one session.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SessionUnavailable`] when the session is
    /// unknown.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn view(&self, session_id: SessionId) -> Result<SessionView, GameError> {
        self.registry
            .with_session(&session_id, |session| session.view())
            .await
            .ok_or_else(|| unknown_session(&session_id))
    }

    /// Drains the registry, persisting every session it still holds.
    ///
    /// Finished sessions are written again; the rewrite is idempotent and
    /// retries any terminal save that failed at game over.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let _guard = self.membership.lock().await;
        let handles = self.registry.drain().await;
        info!(count = handles.len(), "Draining session registry");
        for handle in handles {
            let record = {
                let session = handle.lock().await;
                SessionRecord::from_session(&session)
            };
            if let Err(err) = self.store.save(&record).await {
                error!(
                    session_id = %record.snapshot().session_id(),
                    error = %err,
                    "Failed to persist session during shutdown"
                );
            }
        }
    }

    fn rules_for(&self, variant: Variant) -> Result<Arc<dyn GameRules>, GameError> {
        self.rules
            .get(&variant)
            .cloned()
            .ok_or_else(|| GameError::SessionUnavailable {
                reason: format!("no rules registered for variant {}", variant),
            })
    }

    async fn find_seated(&self, player: &PlayerId) -> Option<SessionView> {
        self.registry.views().await.into_iter().find(|view| {
            *view.status() != SessionStatus::Over
                && view
                    .players()
                    .iter()
                    .flatten()
                    .any(|seated| seated == player)
        })
    }

    async fn find_open(&self, variant: Variant) -> Option<SessionView> {
        self.registry.views().await.into_iter().find(|view| {
            *view.status() == SessionStatus::Waiting
                && *view.variant() == variant
                && view.players().iter().any(Option::is_none)
        })
    }

    async fn persist(&self, record: SessionRecord) {
        let session_id = *record.snapshot().session_id();
        if let Err(err) = self.store.save(&record).await {
            error!(session_id = %session_id, error = %err, "Failed to persist session");
        }
    }

    /// Saves a finished session and, unless finished sessions are
    /// retained, removes it from the registry. Removal only happens after
    /// the save succeeds, so an unsaved session never disappears.
    async fn persist_terminal(&self, record: SessionRecord) {
        let session_id = *record.snapshot().session_id();
        match self.store.save(&record).await {
            Ok(()) => {
                if !*self.config.retain_finished() {
                    self.registry.remove(&session_id).await;
                }
            }
            Err(err) => {
                error!(session_id = %session_id, error = %err, "Failed to persist finished session");
            }
        }
    }
}

fn unknown_session(session_id: &SessionId) -> GameError {
    GameError::SessionUnavailable {
        reason: format!("session {} not found", session_id),
    }
}

fn build_rules(config: &EngineConfig) -> HashMap<Variant, Arc<dyn GameRules>> {
    let mut rules: HashMap<Variant, Arc<dyn GameRules>> = HashMap::new();
    for variant in Variant::ALL {
        let descriptor: Arc<dyn GameRules> = match variant {
            Variant::Nim => Arc::new(NimRules::new(*config.nim().starting_objects())),
        };
        rules.insert(*variant, descriptor);
    }
    rules
}
