//! Misère Nim: players alternate removing 1-3 objects from a shared pile,
//! and the player who removes the last object loses.

mod rules;
mod types;

pub use rules::NimRules;
pub use types::{NimMove, NimState, MAX_TAKE, MIN_TAKE};
