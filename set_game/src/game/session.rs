//! Running game session: spawns the dealer thread and routes input to
//! players.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use super::{
    entities::{PlayerId, SlotIndex},
    errors::{GameError, GameResult},
};
use crate::{
    dealer::actor::{Dealer, GameSummary, ShutdownHandle},
    player::actor::Player,
    table::{config::GameConfig, messages::DisplaySink, slots::Table},
};

/// Handle to a game running on its own dealer thread
pub struct GameHandle {
    players: Vec<Arc<Player>>,
    table: Arc<Table>,
    shutdown: ShutdownHandle,
    dealer: Option<JoinHandle<GameSummary>>,
}

impl GameHandle {
    /// Validates `config`, builds the game and starts the dealer thread,
    /// which in turn starts the player threads.
    pub fn start(config: GameConfig, display: Arc<dyn DisplaySink>) -> GameResult<Self> {
        let dealer = Dealer::new(config, display)?;
        Self::spawn(dealer)
    }

    /// Starts an already-built dealer on its own thread.
    pub fn spawn(dealer: Dealer) -> GameResult<Self> {
        let players = dealer.players().to_vec();
        let table = Arc::clone(dealer.table());
        let shutdown = dealer.shutdown_handle();

        let handle = thread::Builder::new()
            .name("dealer".into())
            .spawn(move || dealer.run())
            .map_err(|source| GameError::Spawn {
                name: "dealer".to_string(),
                source,
            })?;

        Ok(Self {
            players,
            table,
            shutdown,
            dealer: Some(handle),
        })
    }

    /// Delivers a press for a human player from an external input source.
    /// Blocks while the player's action queue is full. Returns `Ok(false)` if the player no
    /// longer accepts input.
    pub fn key_pressed(&self, player: PlayerId, slot: SlotIndex) -> GameResult<bool> {
        let target = self
            .players
            .get(player)
            .ok_or(GameError::UnknownPlayer(player))?;
        if !target.is_human() {
            return Err(GameError::NotHuman(player));
        }
        if slot >= self.table.size() {
            return Err(GameError::SlotOutOfRange {
                slot,
                table_size: self.table.size(),
            });
        }
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        Ok(target.key_pressed(slot))
    }

    pub fn player(&self, id: PlayerId) -> Option<&Arc<Player>> {
        self.players.get(id)
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn scores(&self) -> Vec<u32> {
        self.players.iter().map(|p| p.score()).collect()
    }

    /// Asks the dealer to end the game. Returns immediately; use
    /// [`GameHandle::join`] to wait.
    pub fn shutdown(&self) {
        log::info!("Game shutdown requested");
        self.shutdown.shutdown();
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.dealer.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the dealer to finish and every player thread to exit.
    pub fn join(mut self) -> GameResult<GameSummary> {
        let handle = self.dealer.take().ok_or(GameError::GameOver)?;
        handle.join().map_err(|_| GameError::DealerPanicked)
    }
}

impl Drop for GameHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.dealer.take() {
            self.shutdown.shutdown();
            let _ = handle.join();
        }
    }
}
