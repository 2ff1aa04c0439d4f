//! Error types for configuration and game lifecycle.

use thiserror::Error;

use super::entities::{PlayerId, SlotIndex};

/// Configuration violations. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value the game cannot run with
    #[error("Invalid configuration for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// An environment variable was set but could not be parsed
    #[error("Invalid value for environment variable {var}: {value}")]
    Env { var: String, value: String },

    /// Failed to read a configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file
    #[error("Failed to parse configuration file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the game session handle.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operating system refused to start a thread
    #[error("Failed to spawn thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Presses for simulated players come only from their generator thread
    #[error("Player {0} is not a human player")]
    NotHuman(PlayerId),

    #[error("Slot {slot} out of range (table size {table_size})")]
    SlotOutOfRange {
        slot: SlotIndex,
        table_size: usize,
    },

    /// The game already finished; presses are no longer accepted
    #[error("Game is over")]
    GameOver,

    /// The dealer thread panicked before producing a summary
    #[error("Dealer thread panicked")]
    DealerPanicked,
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
