//! # Set Game
//!
//! Concurrency core of a timed, multiplayer set-matching card game.
//!
//! A shared table of card slots is mutated by several player threads, which
//! mark slots with tokens, and one dealer thread, which deals cards, runs the
//! round timer and rules on claims. Rendering, keyboard mapping and
//! configuration loading sit outside the core and talk to it through
//! [`table::DisplaySink`], [`GameHandle::key_pressed`] and
//! [`table::GameConfig`].
//!
//! ## Threads
//!
//! - **Dealer**: deals, times rounds, drains the FIFO claim queue
//! - **Player** (one per participant): turns key presses into token toggles
//! - **Computer** (one per simulated player): generates key presses
//!
//! ## Core Modules
//!
//! - [`game`]: cards, deck, matching predicate, session handle
//! - [`table`]: per-slot locked table, configuration, display events
//! - [`player`]: player threads and their action queues
//! - [`dealer`]: claim queue and the dealer loop
//!
//! ## Example
//!
//! ```no_run
//! use set_game::{GameConfig, GameHandle, table::LogDisplay};
//! use std::sync::Arc;
//!
//! let config = GameConfig {
//!     players: 3,
//!     ..Default::default()
//! };
//! let game = GameHandle::start(config, Arc::new(LogDisplay)).unwrap();
//! let summary = game.join().unwrap();
//! println!("Winners: {:?}", summary.winners);
//! ```

/// Card identifiers, matching rules and the game session.
pub mod game;
pub use game::{
    Card, ConfigError, Deck, FeatureSpace, Features, GameError, GameHandle, PlayerId, SlotIndex,
    constants, functional,
};

/// Shared table state, configuration and display notifications.
pub mod table;
pub use table::{DisplayEvent, DisplaySink, GameConfig, StaleClaimPolicy, Table};

/// Player threads.
pub mod player;
pub use player::{ClaimOutcome, Player};

/// Dealer thread and claim queue.
pub mod dealer;
pub use dealer::{ClaimQueue, Dealer, GameSummary, ShutdownHandle};

