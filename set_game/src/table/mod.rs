//! Shared table state, configuration and display notifications.
//!
//! ## Locking
//!
//! Every slot owns its own mutex. Player threads lock one slot at a time to
//! toggle tokens; the dealer locks the slots of a claim together, always in
//! ascending slot order, so concurrent toggles on different slots never wait
//! on each other and no lock cycle can form.
//!
//! ## Example
//!
//! ```
//! use set_game::table::{NullDisplay, Table};
//! use set_game::Card;
//! use std::sync::Arc;
//!
//! let table = Table::new(12, 3, Arc::new(NullDisplay));
//! assert!(table.deal_card(0, Card(17)));
//! assert!(table.place_token(1, 0));
//! assert_eq!(table.count_tokens_by_player(1), 1);
//! ```

pub mod config;
pub mod messages;
pub mod slots;

pub use config::{GameConfig, StaleClaimPolicy, TimerMode};
pub use messages::{DisplayEvent, DisplaySink, LogDisplay, NullDisplay, RecordingDisplay};
pub use slots::{LockedSlots, RemovedCard, Slot, Table, TokenToggle};
