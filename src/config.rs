//! Engine configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::games::NimRules;

/// What a deliberate `leave` does to a session that is in progress.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeavePolicy {
    /// The seat stays reserved so the player can rejoin; the game keeps
    /// waiting for their move.
    Detach,
    /// The game ends immediately and every remaining player wins.
    Forfeit,
}

/// Engine-wide settings.
#[derive(Debug, Clone, Getters, Serialize, Deserialize, new)]
pub struct EngineConfig {
    /// Departure handling for in-progress sessions.
    #[serde(default = "default_leave_policy")]
    leave_policy: LeavePolicy,

    /// Whether finished sessions stay addressable in the registry.
    #[serde(default = "default_retain_finished")]
    retain_finished: bool,

    /// Nim variant settings.
    #[serde(default)]
    nim: NimConfig,
}

/// Settings for the Nim variant.
#[derive(Debug, Clone, Getters, Serialize, Deserialize, new)]
pub struct NimConfig {
    /// Objects in the pile when a session is created.
    #[serde(default = "default_starting_objects")]
    starting_objects: u32,
}

#[instrument]
fn default_leave_policy() -> LeavePolicy {
    LeavePolicy::Detach
}

#[instrument]
fn default_retain_finished() -> bool {
    true
}

#[instrument]
fn default_starting_objects() -> u32 {
    NimRules::DEFAULT_STARTING_OBJECTS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            leave_policy: default_leave_policy(),
            retain_finished: default_retain_finished(),
            nim: NimConfig::default(),
        }
    }
}

impl Default for NimConfig {
    fn default() -> Self {
        Self {
            starting_objects: default_starting_objects(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(
            leave_policy = %config.leave_policy,
            retain_finished = config.retain_finished,
            "Config loaded successfully"
        );
        Ok(config)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
