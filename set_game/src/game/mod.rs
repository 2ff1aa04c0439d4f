//! Cards, the deck, the matching rules and the running session.
//!
//! This module provides:
//! - Card identifiers and their feature encoding
//! - The shuffled draw pool
//! - The pure matching predicate and match search
//! - The session handle that runs a game on its own threads

pub mod constants;
pub mod entities;
pub mod errors;
pub mod functional;
pub mod session;

pub use entities::{Card, Deck, FeatureSpace, Features, PlayerId, SlotIndex};
pub use errors::{ConfigError, ConfigResult, GameError, GameResult};
pub use session::GameHandle;
