//! Matchroom - server-authoritative session engine for turn-based games
//!
//! The engine owns every match outright: clients submit intents (join,
//! move, leave) and receive either a full-snapshot `gameUpdate` or a
//! player-scoped `gameError`. Whose turn it is, whether a move is legal,
//! and when a game ends are derived server-side from the append-only move
//! log, never trusted from the client.
//!
//! # Architecture
//!
//! - **Engine**: session lifecycle, move validation, and turn order
//! - **Registry**: per-session exclusive access without a global lock
//! - **Broadcast**: snapshot fan-out and player-scoped rejections
//! - **Games**: pluggable rules descriptors (currently misère Nim)
//! - **Store**: save/load of session documents at creation and game over
//!
//! # Example
//!
//! ```no_run
//! use matchroom::{EngineConfig, MemoryStore, MovePayload, SessionEngine, Variant};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), matchroom::GameError> {
//! let engine = SessionEngine::new(EngineConfig::default(), Arc::new(MemoryStore::new()));
//!
//! // Two players pair up in one Nim session.
//! let view = engine.join_or_create(Variant::Nim, "alice".to_string()).await?;
//! engine.join(*view.session_id(), "bob".to_string()).await?;
//!
//! // Seat 0 opens; every accepted move hands the turn over.
//! let after = engine
//!     .submit_move(*view.session_id(), "alice".to_string(), MovePayload::nim(2))
//!     .await?;
//! println!("state after the opening move: {:?}", after.state());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod broadcast;
mod config;
mod engine;
mod error;
mod games;
mod registry;
mod session;
mod store;
mod turn;

// Crate-level exports - Engine
pub use engine::SessionEngine;

// Crate-level exports - Configuration
pub use config::{ConfigError, EngineConfig, LeavePolicy, NimConfig};

// Crate-level exports - Error taxonomy
pub use error::GameError;

// Crate-level exports - Broadcast
pub use broadcast::{Broadcaster, ConnectionId, EventSender, GameEvent};

// Crate-level exports - Session types
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{
    MoveRecord, PlayerId, Session, SessionId, SessionStatus, SessionView,
};

// Crate-level exports - Turn derivation
pub use turn::mover_seat;

// Crate-level exports - Persistence
pub use store::{JsonFileStore, MemoryStore, SessionRecord, SessionStore, StoreError};

// Crate-level exports - Game variants
pub use games::{
    GameRules, GameState, MovePayload, MoveViolation, NimMove, NimRules, NimState, Variant,
    MAX_TAKE, MIN_TAKE,
};
