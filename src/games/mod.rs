//! Game variants and the rules contract the session engine dispatches through.
//!
//! Each variant supplies three pure functions behind [`GameRules`]: a move
//! legality predicate, a state transition, and a terminal predicate that
//! names the winning seats. The engine is variant-agnostic beyond this
//! contract; sessions carry a [`Variant`] tag that selects the descriptor.

mod nim;

pub use nim::{NimMove, NimRules, NimState, MAX_TAKE, MIN_TAKE};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Identifies the ruleset a session is playing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Variant {
    /// Misère Nim: take 1-3 objects; whoever removes the last object loses.
    Nim,
}

impl Variant {
    /// Every variant the engine knows how to play.
    pub const ALL: &'static [Variant] = &[Variant::Nim];
}

/// Variant-specific move payload submitted by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum MovePayload {
    /// A Nim take.
    Nim(NimMove),
}

impl MovePayload {
    /// Convenience constructor for a Nim take.
    pub fn nim(num_objects: u32) -> Self {
        Self::Nim(NimMove::new(num_objects))
    }

    /// The variant this payload belongs to.
    pub fn variant(&self) -> Variant {
        match self {
            Self::Nim(_) => Variant::Nim,
        }
    }
}

/// Variant-specific derived state, recomputed from the move log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum GameState {
    /// Nim pile state.
    Nim(NimState),
}

impl GameState {
    /// The variant this state belongs to.
    pub fn variant(&self) -> Variant {
        match self {
            Self::Nim(_) => Variant::Nim,
        }
    }
}

/// Why a proposed move is illegal under the variant's rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveViolation {
    /// The take is outside the variant's allowed range.
    #[display("can only take {MIN_TAKE} to {MAX_TAKE} objects, got {requested}")]
    TakeOutOfRange {
        /// Number of objects the player asked to remove.
        requested: u32,
    },
    /// The take is larger than what remains in the pile.
    #[display("cannot take {requested} objects from a pile of {remaining}")]
    TakeExceedsPile {
        /// Number of objects the player asked to remove.
        requested: u32,
        /// Objects left in the pile.
        remaining: u32,
    },
    /// The payload was built for a different variant than the session plays.
    #[display("move payload does not match the session's game variant")]
    VariantMismatch,
}

/// Rules descriptor for one game variant.
///
/// Implementations must be pure: no interior state, no side effects. The
/// engine holds one descriptor per [`Variant`] and calls it under the
/// session's exclusive lock, so the functions must also be cheap.
pub trait GameRules: std::fmt::Debug + Send + Sync {
    /// The variant tag this descriptor serves.
    fn variant(&self) -> Variant;

    /// Fixed number of player seats in a session of this variant.
    fn capacity(&self) -> usize;

    /// State a fresh session starts from.
    fn initial_state(&self) -> GameState;

    /// Checks whether `payload` is legal in `state`.
    fn check_move(&self, state: &GameState, payload: &MovePayload) -> Result<(), MoveViolation>;

    /// Applies a legal move, producing the next state.
    ///
    /// Callers must run [`GameRules::check_move`] first; applying an illegal
    /// move is a contract violation.
    fn apply_move(&self, state: &GameState, payload: &MovePayload) -> GameState;

    /// Terminal predicate, evaluated after a move by the player in
    /// `mover_seat` produced `state`.
    ///
    /// Returns `None` while play continues, otherwise the ordered list of
    /// winning seat indices (empty list = draw).
    fn outcome(&self, state: &GameState, mover_seat: usize) -> Option<Vec<usize>>;
}
