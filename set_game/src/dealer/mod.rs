//! The dealer: sole writer of card state and judge of claims.

pub mod actor;
pub mod claims;

pub use actor::{Dealer, GameSummary, ShutdownHandle};
pub use claims::ClaimQueue;
