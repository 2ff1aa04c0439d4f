//! Player threads.
//!
//! Each player runs on its own thread, draining a bounded queue of key
//! presses into token toggles. Simulated players get a second thread that
//! feeds random presses at a fixed cadence; the queue's capacity (the claim
//! size) paces it.
//!
//! ## Claim handshake
//!
//! A toggle that completes a claim-sized token set pushes the player onto the
//! dealer's claim queue and parks the thread on the player's condition
//! variable. The dealer applies `point` or `penalty` and then `release`;
//! the player only resumes after the release, so it never observes a
//! half-applied verdict.

pub mod actions;
pub mod actor;
mod decision;
pub mod models;

pub use actions::ActionQueue;
pub use actor::Player;
pub use models::{ClaimOutcome, ClaimStatus, PlayerState};
