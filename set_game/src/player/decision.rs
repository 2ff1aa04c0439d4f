//! Key press generator for simulated players.

use rand::Rng;
use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use super::actor::Player;

/// Starts the generator thread feeding random presses into `player`'s action
/// queue. The thread exits when the player is terminated.
pub(crate) fn spawn_generator(player: Arc<Player>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("computer-{}", player.id()))
        .spawn(move || run_generator(&player))
}

fn run_generator(player: &Player) {
    log::info!("Computer {} thread starting", player.id());

    let mut rng = rand::rng();
    let table_size = player.table().size();
    let cadence = player.ai_press();

    while !player.is_terminated() {
        let slot = rng.random_range(0..table_size);
        // Blocks while the queue is full, which is what paces a frozen or
        // claiming player.
        if !player.actions().put(slot) {
            break;
        }
        if !cadence.is_zero() && player.actions().wait_closed(cadence) {
            break;
        }
    }

    log::info!("Computer {} thread terminated", player.id());
}
