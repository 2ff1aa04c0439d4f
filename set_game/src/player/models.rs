//! Per-player state mutated by the dealer's verdicts.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Where a player stands in the claim handshake with the dealer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    #[default]
    Idle,
    /// Queued for verification; the player thread is blocked
    Pending,
    /// Dealer finished with the claim; the player may resume
    Released,
}

/// Score and freeze deadline. Written only by the dealer through
/// `Player::point` and `Player::penalty`; the claim status is the
/// player/dealer rendezvous flag.
#[derive(Clone, Debug, Default)]
pub struct PlayerState {
    pub score: u32,
    pub freeze_until: Option<Instant>,
    pub claim: ClaimStatus,
}

impl PlayerState {
    /// Time left on the freeze at `now`; zero when not frozen.
    pub fn frozen_for(&self, now: Instant) -> Duration {
        self.freeze_until
            .map_or(Duration::ZERO, |until| until.saturating_duration_since(now))
    }
}

/// Outcome of the dealer's verification of one claim
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ClaimOutcome {
    /// The cards matched and were replaced
    Accepted { slots: Vec<usize> },
    /// The cards did not match; the claimant was penalized
    Rejected,
    /// The claim lost a token before verification
    Stale,
}
