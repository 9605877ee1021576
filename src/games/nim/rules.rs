//! Rules descriptor wiring misère Nim into the engine's variant contract.

use super::types::{NimState, MAX_TAKE, MIN_TAKE};
use crate::games::{GameRules, GameState, MovePayload, MoveViolation, Variant};

/// Seats in a Nim session.
const NIM_CAPACITY: usize = 2;

/// Misère Nim rules over a configurable starting pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NimRules {
    starting_objects: u32,
}

impl NimRules {
    /// Conventional pile size for a standard match.
    pub const DEFAULT_STARTING_OBJECTS: u32 = 21;

    /// Builds rules over a pile of `starting_objects`.
    ///
    /// A zero pile is raised to one object so the opening take always
    /// exists; otherwise the session could never leave `IN_PROGRESS`.
    pub fn new(starting_objects: u32) -> Self {
        Self {
            starting_objects: starting_objects.max(MIN_TAKE),
        }
    }

    /// Pile size a fresh session starts with.
    pub fn starting_objects(&self) -> u32 {
        self.starting_objects
    }
}

impl Default for NimRules {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STARTING_OBJECTS)
    }
}

impl GameRules for NimRules {
    fn variant(&self) -> Variant {
        Variant::Nim
    }

    fn capacity(&self) -> usize {
        NIM_CAPACITY
    }

    fn initial_state(&self) -> GameState {
        GameState::Nim(NimState::new(self.starting_objects))
    }

    fn check_move(&self, state: &GameState, payload: &MovePayload) -> Result<(), MoveViolation> {
        let (GameState::Nim(pile), MovePayload::Nim(mv)) = (state, payload);
        let requested = mv.num_objects();
        if !(MIN_TAKE..=MAX_TAKE).contains(&requested) {
            return Err(MoveViolation::TakeOutOfRange { requested });
        }
        let remaining = pile.remaining_objects();
        if requested > remaining {
            return Err(MoveViolation::TakeExceedsPile {
                requested,
                remaining,
            });
        }
        Ok(())
    }

    fn apply_move(&self, state: &GameState, payload: &MovePayload) -> GameState {
        let (GameState::Nim(pile), MovePayload::Nim(mv)) = (state, payload);
        GameState::Nim(pile.take(mv.num_objects()))
    }

    fn outcome(&self, state: &GameState, mover_seat: usize) -> Option<Vec<usize>> {
        let GameState::Nim(pile) = state;
        if pile.is_exhausted() {
            // Misère: emptying the pile loses, so the other seat wins.
            Some(vec![(mover_seat + 1) % NIM_CAPACITY])
        } else {
            None
        }
    }
}
