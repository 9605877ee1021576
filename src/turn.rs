//! Turn derivation.
//!
//! The engine never stores whose turn it is. The seat to move is a pure
//! function of the accepted move count and the seat capacity, so the move
//! log stays the single source of truth and the turn pointer can never
//! drift out of sync with it.

/// Seat index that holds the turn after `move_count` accepted moves.
///
/// Seats rotate in fixed order: seat 0 opens, and each accepted move hands
/// the turn to the next seat, wrapping at `capacity`.
pub fn mover_seat(move_count: usize, capacity: usize) -> usize {
    debug_assert!(capacity > 0, "a session always has at least one seat");
    move_count % capacity
}
