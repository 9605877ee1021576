//! Core domain types for misère Nim.

use derive_new::new;
use serde::{Deserialize, Serialize};

/// Smallest number of objects a player may remove in one turn.
pub const MIN_TAKE: u32 = 1;

/// Largest number of objects a player may remove in one turn.
pub const MAX_TAKE: u32 = 3;

/// A Nim move: remove `num_objects` from the shared pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct NimMove {
    num_objects: u32,
}

impl NimMove {
    /// Number of objects this move removes.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }
}

/// Nim pile state, derived from the move log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct NimState {
    remaining_objects: u32,
}

impl NimState {
    /// Objects left in the shared pile.
    pub fn remaining_objects(&self) -> u32 {
        self.remaining_objects
    }

    /// Whether the pile has been emptied.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_objects == 0
    }

    /// The pile after removing `num_objects`.
    pub fn take(&self, num_objects: u32) -> NimState {
        NimState {
            remaining_objects: self.remaining_objects.saturating_sub(num_objects),
        }
    }
}
