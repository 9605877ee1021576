//! Session data model and its externally visible projection.
//!
//! A [`Session`] owns the authoritative record of one match: the seat
//! roster, the append-only move log, the derived game state, and the
//! lifecycle status. All mutation goes through methods that keep those
//! pieces consistent; callers outside the crate only ever see a
//! [`SessionView`] snapshot.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::games::{GameState, MovePayload, Variant};
use crate::turn;

/// Unique identifier for a session, assigned at creation.
pub type SessionId = Uuid;

/// Stable identity of a player across connections.
pub type PlayerId = String;

/// Lifecycle status of a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Seats are still open; moves are rejected.
    Waiting,
    /// All seats are filled and moves are accepted.
    InProgress,
    /// The match reached a terminal state; the session is read-only.
    Over,
}

/// One accepted move in a session's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// Player who made the move.
    player: PlayerId,
    /// The move itself.
    payload: MovePayload,
    /// Zero-based position in the move log.
    index: usize,
}

/// Externally visible snapshot of a session.
///
/// Broadcast to subscribers after every accepted mutation and returned from
/// read operations. Cheap to clone and fully serializable, so transports can
/// ship it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session identifier.
    session_id: SessionId,
    /// Variant the session plays.
    variant: Variant,
    /// Seat roster in seat order; `None` marks an open seat.
    players: Vec<Option<PlayerId>>,
    /// Current lifecycle status.
    status: SessionStatus,
    /// Accepted moves in order.
    moves: Vec<MoveRecord>,
    /// Variant state derived from the move log.
    state: GameState,
    /// Winning players once the session is over; empty otherwise or on a draw.
    winners: Vec<PlayerId>,
}

/// Authoritative state of one match.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    variant: Variant,
    seats: Vec<Option<PlayerId>>,
    status: SessionStatus,
    moves: Vec<MoveRecord>,
    state: GameState,
    winners: Vec<PlayerId>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a session in `WAITING` with the requester in seat 0.
    #[instrument(skip(initial_state), fields(variant = %variant, player_id = %first_player))]
    pub fn new(
        variant: Variant,
        capacity: usize,
        initial_state: GameState,
        first_player: PlayerId,
    ) -> Self {
        let id = Uuid::new_v4();
        let mut seats = vec![None; capacity];
        seats[0] = Some(first_player);
        info!(session_id = %id, capacity, "Creating new session");
        Self {
            id,
            variant,
            seats,
            status: SessionStatus::Waiting,
            moves: Vec::new(),
            state: initial_state,
            winners: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Variant the session plays.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Variant state derived from the move log.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Accepted moves in order.
    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// When the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the session reached `OVER`, if it has.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Seat index occupied by `player`, if seated.
    pub fn seat_of(&self, player: &PlayerId) -> Option<usize> {
        self.seats
            .iter()
            .position(|seat| seat.as_deref() == Some(player.as_str()))
    }

    /// Whether `player` occupies a seat.
    pub fn is_seated(&self, player: &PlayerId) -> bool {
        self.seat_of(player).is_some()
    }

    /// Whether every seat is filled.
    pub fn is_full(&self) -> bool {
        self.seats.iter().all(Option::is_some)
    }

    /// Seats `player` in the first open slot, returning the seat index.
    ///
    /// Returns `None` when every seat is taken. Does not change the
    /// lifecycle status; callers decide when the session starts.
    #[instrument(skip(self), fields(session_id = %self.id, player_id = %player))]
    pub fn seat_player(&mut self, player: PlayerId) -> Option<usize> {
        let seat = self.seats.iter().position(Option::is_none)?;
        info!(seat, "Seating player");
        self.seats[seat] = Some(player);
        Some(seat)
    }

    /// Opens `seat` back up.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn vacate_seat(&mut self, seat: usize) {
        if let Some(slot) = self.seats.get_mut(seat) {
            debug!(seat, "Vacating seat");
            *slot = None;
        }
    }

    /// Transitions `WAITING` -> `IN_PROGRESS` once every seat is filled.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn start(&mut self) {
        debug_assert!(self.is_full(), "a session only starts once full");
        info!("All seats filled, game starting");
        self.status = SessionStatus::InProgress;
    }

    /// Seat index that holds the turn.
    pub fn mover_seat(&self) -> usize {
        turn::mover_seat(self.moves.len(), self.seats.len())
    }

    /// Player who holds the turn, when that seat is filled.
    pub fn current_mover(&self) -> Option<&PlayerId> {
        self.seats[self.mover_seat()].as_ref()
    }

    /// Appends an accepted move and installs the state it produced.
    pub fn record_move(&mut self, player: PlayerId, payload: MovePayload, next_state: GameState) {
        let index = self.moves.len();
        self.moves.push(MoveRecord::new(player, payload, index));
        self.state = next_state;
    }

    /// Players occupying the given seats, in the given order.
    pub fn players_at(&self, seats: &[usize]) -> Vec<PlayerId> {
        seats
            .iter()
            .filter_map(|&seat| self.seats.get(seat).cloned().flatten())
            .collect()
    }

    /// Every seated player except the one in `seat`, in seat order.
    pub fn seated_players_except(&self, seat: usize) -> Vec<PlayerId> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != seat)
            .filter_map(|(_, slot)| slot.clone())
            .collect()
    }

    /// Transitions to `OVER` with the given winners (empty = draw).
    #[instrument(skip(self, winners), fields(session_id = %self.id))]
    pub fn finish(&mut self, winners: Vec<PlayerId>) {
        info!(winners = ?winners, "Game over");
        self.status = SessionStatus::Over;
        self.winners = winners;
        self.finished_at = Some(Utc::now());
    }

    /// Full snapshot for broadcast and read operations.
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            variant: self.variant,
            players: self.seats.clone(),
            status: self.status,
            moves: self.moves.clone(),
            state: self.state,
            winners: self.winners.clone(),
        }
    }
}
