//! Rejection taxonomy for engine operations.
//!
//! Every failure a player can cause maps onto one of these variants so
//! clients can react programmatically via [`GameError::code`] without
//! parsing display text. Infrastructure failures (persistence, I/O) are
//! deliberately absent: those are logged server-side and never surface to
//! the player who triggered the operation.

use derive_more::{Display, Error};

use crate::games::MoveViolation;
use crate::session::{PlayerId, SessionStatus};

/// A rejected engine operation, scoped to the requesting player.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// Another seat holds the turn. The client should wait for the next
    /// session update before retrying.
    #[display("not your turn")]
    NotYourTurn {
        /// Player whose turn it is, when that seat is filled.
        expected: Option<PlayerId>,
    },
    /// The payload violates the variant's move rules.
    #[display("invalid move: {source}")]
    InvalidMove {
        /// The specific rule the move broke.
        source: MoveViolation,
    },
    /// The session exists but is not accepting moves right now.
    #[display("game is not in progress (status {status})")]
    GameNotInProgress {
        /// Lifecycle status the session was in when the move arrived.
        status: SessionStatus,
    },
    /// The operation targeted a session that is unknown, full, or finished.
    #[display("session unavailable: {reason}")]
    SessionUnavailable {
        /// Human-readable explanation of why the session cannot be used.
        reason: String,
    },
}

impl GameError {
    /// Stable machine tag for this rejection, suitable for wire payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotYourTurn { .. } => "notYourTurn",
            Self::InvalidMove { .. } => "invalidMove",
            Self::GameNotInProgress { .. } => "gameNotInProgress",
            Self::SessionUnavailable { .. } => "sessionUnavailable",
        }
    }
}

impl From<MoveViolation> for GameError {
    fn from(source: MoveViolation) -> Self {
        Self::InvalidMove { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let errors = [
            (
                GameError::NotYourTurn { expected: None },
                "notYourTurn",
            ),
            (
                GameError::from(MoveViolation::TakeOutOfRange { requested: 4 }),
                "invalidMove",
            ),
            (
                GameError::GameNotInProgress {
                    status: SessionStatus::Waiting,
                },
                "gameNotInProgress",
            ),
            (
                GameError::SessionUnavailable {
                    reason: "gone".to_string(),
                },
                "sessionUnavailable",
            ),
        ];
        for (error, code) in errors {
            assert_eq!(error.code(), code);
        }
    }

    #[test]
    fn test_invalid_move_reports_violation() {
        let error = GameError::from(MoveViolation::TakeExceedsPile {
            requested: 3,
            remaining: 1,
        });
        assert_eq!(
            error.to_string(),
            "invalid move: cannot take 3 objects from a pile of 1"
        );
    }
}
