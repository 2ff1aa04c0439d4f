//! Game configuration models.

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr, time::Duration};

use crate::game::{
    constants::*,
    entities::FeatureSpace,
    errors::{ConfigError, ConfigResult},
};

/// What the dealer does with a claim whose tokens were cleared before it was
/// verified (another accepted claim or a reshuffle took one of its cards).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleClaimPolicy {
    /// Wake the claimant without a verdict
    #[default]
    Release,
    /// Treat the claim as invalid and apply the penalty freeze
    Penalize,
}

impl fmt::Display for StaleClaimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleClaimPolicy::Release => write!(f, "release"),
            StaleClaimPolicy::Penalize => write!(f, "penalize"),
        }
    }
}

impl FromStr for StaleClaimPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "release" => Ok(StaleClaimPolicy::Release),
            "penalize" => Ok(StaleClaimPolicy::Penalize),
            other => Err(format!("unknown stale claim policy: {other}")),
        }
    }
}

/// Round timer behaviour derived from `turn_timeout_millis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Reshuffle when the countdown reaches zero
    Countdown(Duration),
    /// Show time since the last deal; reshuffle only when no match remains
    Elapsed,
    /// No timer display; reshuffle only when no match remains
    Disabled,
}

/// Game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of players, human and simulated
    pub players: usize,

    /// How many of the players (the first ids) take input from outside
    pub human_players: usize,

    /// Number of card slots
    pub table_size: usize,

    /// Tokens needed to trigger verification
    pub claim_size: usize,

    /// Values per feature channel
    pub feature_size: u8,

    /// Feature channels per card
    pub feature_count: u8,

    /// Round length: >0 countdown, 0 elapsed-time mode, <0 no timer
    pub turn_timeout_millis: i64,

    /// Remaining time below which the countdown is shown as a warning
    pub turn_timeout_warning_millis: u64,

    /// Freeze after a valid claim
    pub point_freeze_millis: u64,

    /// Freeze after an invalid claim
    pub penalty_freeze_millis: u64,

    /// Pause between individual cards while dealing or collecting
    pub table_delay_millis: u64,

    /// Pause between the winner announcement and shutdown
    pub end_game_pause_millis: u64,

    /// Cadence of simulated key presses
    pub ai_press_millis: u64,

    /// Cadence of freeze and timer display updates
    pub ui_tick_millis: u64,

    /// Log every match on the table after each deal
    pub hints: bool,

    /// Handling of claims that lost a token before verification
    pub stale_claim_policy: StaleClaimPolicy,

    /// Seed for the deck shuffle; `None` seeds from the OS
    pub random_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: DEFAULT_PLAYERS,
            human_players: 0,
            table_size: DEFAULT_TABLE_SIZE,
            claim_size: DEFAULT_CLAIM_SIZE,
            feature_size: DEFAULT_FEATURE_SIZE,
            feature_count: DEFAULT_FEATURE_COUNT,
            turn_timeout_millis: DEFAULT_TURN_TIMEOUT_MILLIS,
            turn_timeout_warning_millis: DEFAULT_TURN_TIMEOUT_WARNING_MILLIS,
            point_freeze_millis: DEFAULT_POINT_FREEZE_MILLIS,
            penalty_freeze_millis: DEFAULT_PENALTY_FREEZE_MILLIS,
            table_delay_millis: DEFAULT_TABLE_DELAY_MILLIS,
            end_game_pause_millis: 0,
            ai_press_millis: DEFAULT_AI_PRESS_MILLIS,
            ui_tick_millis: DEFAULT_UI_TICK_MILLIS,
            hints: false,
            stale_claim_policy: StaleClaimPolicy::default(),
            random_seed: None,
        }
    }
}

impl GameConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigResult<()> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.into(),
            })
        }

        if self.players == 0 {
            return invalid("players", "at least one player is required");
        }
        if self.human_players > self.players {
            return invalid(
                "human_players",
                format!("{} humans exceed {} players", self.human_players, self.players),
            );
        }
        if self.table_size == 0 {
            return invalid("table_size", "table needs at least one slot");
        }
        if self.claim_size < 2 {
            return invalid("claim_size", "a claim needs at least two cards");
        }
        if self.claim_size > self.table_size {
            return invalid(
                "claim_size",
                format!(
                    "claim size {} exceeds table size {}",
                    self.claim_size, self.table_size
                ),
            );
        }
        if self.feature_size < 2 {
            return invalid("feature_size", "features need at least two values");
        }
        if self.feature_count == 0 {
            return invalid("feature_count", "cards need at least one feature");
        }
        // Distinct cards differ on some channel, which then needs
        // `claim_size` distinct values.
        if self.claim_size > usize::from(self.feature_size) {
            return invalid(
                "claim_size",
                format!(
                    "claim size {} exceeds feature size {}, no claim could match",
                    self.claim_size, self.feature_size
                ),
            );
        }
        let deck_size = self.feature_space().deck_size();
        if deck_size > MAX_DECK_SIZE {
            return invalid(
                "feature_count",
                format!("deck of {deck_size} cards exceeds {MAX_DECK_SIZE}"),
            );
        }
        if self.ui_tick_millis == 0 {
            return invalid("ui_tick_millis", "display cadence must be positive");
        }

        Ok(())
    }

    /// Load configuration from `SET_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        let random_seed = match std::env::var("SET_RANDOM_SEED") {
            Ok(value) => Some(value.parse().map_err(|_| ConfigError::Env {
                var: "SET_RANDOM_SEED".to_string(),
                value,
            })?),
            Err(_) => defaults.random_seed,
        };

        let config = Self {
            players: env_or("SET_PLAYERS", defaults.players)?,
            human_players: env_or("SET_HUMAN_PLAYERS", defaults.human_players)?,
            table_size: env_or("SET_TABLE_SIZE", defaults.table_size)?,
            claim_size: env_or("SET_CLAIM_SIZE", defaults.claim_size)?,
            feature_size: env_or("SET_FEATURE_SIZE", defaults.feature_size)?,
            feature_count: env_or("SET_FEATURE_COUNT", defaults.feature_count)?,
            turn_timeout_millis: env_or("SET_TURN_TIMEOUT_MILLIS", defaults.turn_timeout_millis)?,
            turn_timeout_warning_millis: env_or(
                "SET_TURN_TIMEOUT_WARNING_MILLIS",
                defaults.turn_timeout_warning_millis,
            )?,
            point_freeze_millis: env_or("SET_POINT_FREEZE_MILLIS", defaults.point_freeze_millis)?,
            penalty_freeze_millis: env_or(
                "SET_PENALTY_FREEZE_MILLIS",
                defaults.penalty_freeze_millis,
            )?,
            table_delay_millis: env_or("SET_TABLE_DELAY_MILLIS", defaults.table_delay_millis)?,
            end_game_pause_millis: env_or(
                "SET_END_GAME_PAUSE_MILLIS",
                defaults.end_game_pause_millis,
            )?,
            ai_press_millis: env_or("SET_AI_PRESS_MILLIS", defaults.ai_press_millis)?,
            ui_tick_millis: env_or("SET_UI_TICK_MILLIS", defaults.ui_tick_millis)?,
            hints: env_or("SET_HINTS", defaults.hints)?,
            stale_claim_policy: env_or("SET_STALE_CLAIM_POLICY", defaults.stale_claim_policy)?,
            random_seed,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn feature_space(&self) -> FeatureSpace {
        FeatureSpace::new(self.feature_size, self.feature_count)
    }

    pub fn timer_mode(&self) -> TimerMode {
        match self.turn_timeout_millis {
            ms if ms > 0 => TimerMode::Countdown(Duration::from_millis(ms.unsigned_abs())),
            0 => TimerMode::Elapsed,
            _ => TimerMode::Disabled,
        }
    }

    pub fn is_human(&self, player: usize) -> bool {
        player < self.human_players
    }

    pub fn turn_timeout_warning(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_warning_millis)
    }

    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_millis)
    }

    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_millis)
    }

    pub fn table_delay(&self) -> Duration {
        Duration::from_millis(self.table_delay_millis)
    }

    pub fn end_game_pause(&self) -> Duration {
        Duration::from_millis(self.end_game_pause_millis)
    }

    pub fn ai_press(&self) -> Duration {
        Duration::from_millis(self.ai_press_millis)
    }

    pub fn ui_tick(&self) -> Duration {
        Duration::from_millis(self.ui_tick_millis)
    }
}

fn env_or<T: FromStr>(var: &str, default: T) -> ConfigResult<T> {
    match std::env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Env {
            var: var.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feature_space().deck_size(), 81);
        assert_eq!(
            config.timer_mode(),
            TimerMode::Countdown(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_claim_larger_than_table_is_rejected() {
        let config = GameConfig {
            table_size: 2,
            claim_size: 3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "claim_size",
                ..
            })
        ));
    }

    #[test]
    fn test_claim_larger_than_feature_size_is_rejected() {
        let config = GameConfig {
            claim_size: 4,
            feature_size: 3,
            feature_count: 6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "claim_size",
                ..
            })
        ));

        let config = GameConfig {
            claim_size: 4,
            feature_size: 4,
            feature_count: 3,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_too_many_humans_is_rejected() {
        let config = GameConfig {
            players: 1,
            human_players: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_deck_is_rejected() {
        let config = GameConfig {
            feature_size: 10,
            feature_count: 7,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timer_modes() {
        let mut config = GameConfig {
            turn_timeout_millis: 0,
            ..Default::default()
        };
        assert_eq!(config.timer_mode(), TimerMode::Elapsed);
        config.turn_timeout_millis = -1;
        assert_eq!(config.timer_mode(), TimerMode::Disabled);
    }

    #[test]
    fn test_json_fills_missing_fields_with_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"players": 4, "stale_claim_policy": "penalize"}"#)
                .expect("valid json");
        assert_eq!(config.players, 4);
        assert_eq!(config.stale_claim_policy, StaleClaimPolicy::Penalize);
        assert_eq!(config.table_size, DEFAULT_TABLE_SIZE);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_defaults() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe {
            std::env::set_var("SET_PLAYERS", "5");
            std::env::set_var("SET_STALE_CLAIM_POLICY", "penalize");
        }
        let config = GameConfig::from_env();
        unsafe {
            std::env::remove_var("SET_PLAYERS");
            std::env::remove_var("SET_STALE_CLAIM_POLICY");
        }

        let config = config.expect("valid env config");
        assert_eq!(config.players, 5);
        assert_eq!(config.stale_claim_policy, StaleClaimPolicy::Penalize);
    }

    #[test]
    #[serial]
    fn test_from_env_reports_unparsable_values() {
        unsafe {
            std::env::set_var("SET_TABLE_SIZE", "twelve");
        }
        let result = GameConfig::from_env();
        unsafe {
            std::env::remove_var("SET_TABLE_SIZE");
        }

        match result {
            Err(ConfigError::Env { var, value }) => {
                assert_eq!(var, "SET_TABLE_SIZE");
                assert_eq!(value, "twelve");
            }
            other => panic!("Expected env error, got {other:?}"),
        }
    }
}
