//! Default game parameters.

/// Number of card slots on the table.
pub const DEFAULT_TABLE_SIZE: usize = 12;

/// Number of tokens that make up one claim.
pub const DEFAULT_CLAIM_SIZE: usize = 3;

/// Values per feature channel.
pub const DEFAULT_FEATURE_SIZE: u8 = 3;

/// Feature channels per card.
pub const DEFAULT_FEATURE_COUNT: u8 = 4;

pub const DEFAULT_PLAYERS: usize = 2;

/// Round length. A positive value runs a countdown, zero shows elapsed time
/// and a negative value disables the round timer display.
pub const DEFAULT_TURN_TIMEOUT_MILLIS: i64 = 60_000;

pub const DEFAULT_TURN_TIMEOUT_WARNING_MILLIS: u64 = 5_000;
pub const DEFAULT_POINT_FREEZE_MILLIS: u64 = 1_000;
pub const DEFAULT_PENALTY_FREEZE_MILLIS: u64 = 3_000;
pub const DEFAULT_TABLE_DELAY_MILLIS: u64 = 100;
pub const DEFAULT_AI_PRESS_MILLIS: u64 = 10;
pub const DEFAULT_UI_TICK_MILLIS: u64 = 100;

/// Upper bound on the deck size (`feature_size ^ feature_count`).
pub const MAX_DECK_SIZE: u64 = 1 << 20;
