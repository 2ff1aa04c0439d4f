//! Player thread: drains key presses into token toggles and hands completed
//! claims to the dealer.

use parking_lot::{Condvar, Mutex};
use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use super::{
    actions::ActionQueue,
    decision,
    models::{ClaimStatus, PlayerState},
};
use crate::{
    dealer::claims::ClaimQueue,
    game::entities::{PlayerId, SlotIndex},
    table::{
        config::GameConfig,
        messages::DisplayEvent,
        slots::{Table, TokenToggle},
    },
};

/// One participant. Shared between its own thread, its generator thread (for
/// simulated players) and the dealer.
pub struct Player {
    id: PlayerId,
    human: bool,
    table: Arc<Table>,
    claims: Arc<ClaimQueue>,
    actions: ActionQueue,
    state: Mutex<PlayerState>,
    /// Signalled on release, new freeze and termination
    wakeup: Condvar,
    terminate: AtomicBool,
    point_freeze: Duration,
    penalty_freeze: Duration,
    ui_tick: Duration,
    ai_press: Duration,
}

impl Player {
    pub fn new(
        id: PlayerId,
        human: bool,
        config: &GameConfig,
        table: Arc<Table>,
        claims: Arc<ClaimQueue>,
    ) -> Self {
        Self {
            id,
            human,
            actions: ActionQueue::new(table.claim_size()),
            table,
            claims,
            state: Mutex::new(PlayerState::default()),
            wakeup: Condvar::new(),
            terminate: AtomicBool::new(false),
            point_freeze: config.point_freeze(),
            penalty_freeze: config.penalty_freeze(),
            ui_tick: config.ui_tick(),
            ai_press: config.ai_press(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn is_human(&self) -> bool {
        self.human
    }

    pub fn score(&self) -> u32 {
        self.state.lock().score
    }

    /// Remaining freeze; zero when the player is active.
    pub fn frozen_for(&self) -> Duration {
        self.state.lock().frozen_for(Instant::now())
    }

    pub fn claim_status(&self) -> ClaimStatus {
        self.state.lock().claim
    }

    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    pub fn pending_actions(&self) -> usize {
        self.actions.len()
    }

    pub(super) fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    pub(super) fn table(&self) -> &Table {
        &self.table
    }

    pub(super) fn ai_press(&self) -> Duration {
        self.ai_press
    }

    /// Queues a press on `slot`, blocking while the action queue is full.
    /// Returns `false` once the player is terminated.
    pub fn key_pressed(&self, slot: SlotIndex) -> bool {
        !self.is_terminated() && self.actions.put(slot)
    }

    /// Starts the player thread.
    pub fn spawn(self: &Arc<Self>) -> io::Result<JoinHandle<()>> {
        let player = Arc::clone(self);
        thread::Builder::new()
            .name(format!("player-{}", self.id))
            .spawn(move || player.run())
    }

    /// Main loop of the player thread.
    pub fn run(self: Arc<Self>) {
        log::info!("Player {} thread starting", self.id);

        let generator = if self.human {
            None
        } else {
            match decision::spawn_generator(Arc::clone(&self)) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::error!("Player {}: failed to start key generator: {}", self.id, e);
                    None
                }
            }
        };

        while !self.is_terminated() {
            if !self.wait_while_frozen() {
                break;
            }
            let Some(slot) = self.actions.take() else {
                break;
            };

            let toggle = self.table.toggle_token(self.id, slot);
            if toggle == TokenToggle::Placed
                && self.table.count_tokens_by_player(self.id) == self.table.claim_size()
            {
                self.claim();
            }
        }

        if let Some(handle) = generator {
            if handle.join().is_err() {
                log::error!("Player {}: key generator thread panicked", self.id);
            }
        }
        log::info!("Player {} thread terminated", self.id);
    }

    /// Registers on the claim queue and blocks until the dealer releases the
    /// claim or the player is terminated.
    fn claim(&self) {
        self.state.lock().claim = ClaimStatus::Pending;
        if !self.claims.push(self.id) {
            self.state.lock().claim = ClaimStatus::Idle;
            return;
        }
        log::debug!("Player {} claims {:?}", self.id, self.table.tokens_of(self.id));

        let mut state = self.state.lock();
        while state.claim == ClaimStatus::Pending && !self.is_terminated() {
            self.wakeup.wait(&mut state);
        }
        state.claim = ClaimStatus::Idle;
    }

    /// Blocks until the freeze deadline passes, publishing the remaining time
    /// every UI tick. Returns `false` if the player was terminated.
    fn wait_while_frozen(&self) -> bool {
        let mut announced = false;
        loop {
            let remaining = {
                let state = self.state.lock();
                if self.is_terminated() {
                    return false;
                }
                state.frozen_for(Instant::now())
            };

            let display = self.table.display();
            if remaining.is_zero() {
                if announced {
                    display.notify(DisplayEvent::freeze(self.id, Duration::ZERO));
                }
                return true;
            }
            announced = true;
            display.notify(DisplayEvent::freeze(self.id, remaining));

            // Display calls happen unlocked; recheck the flag before parking.
            let mut state = self.state.lock();
            if self.is_terminated() {
                return false;
            }
            let remaining = state.frozen_for(Instant::now());
            if !remaining.is_zero() {
                self.wakeup
                    .wait_for(&mut state, remaining.min(self.ui_tick));
            }
        }
    }

    /// Awards a point and starts the point freeze. Dealer only; runs before
    /// [`Player::release`].
    pub fn point(&self) {
        let score = {
            let mut state = self.state.lock();
            state.score += 1;
            state.freeze_until = freeze_deadline(self.point_freeze);
            state.score
        };
        log::info!("Player {} scores, now at {}", self.id, score);

        let display = self.table.display();
        display.notify(DisplayEvent::Score {
            player: self.id,
            score,
        });
        display.notify(DisplayEvent::freeze(self.id, self.point_freeze));
    }

    /// Starts the penalty freeze. Dealer only; runs before
    /// [`Player::release`].
    pub fn penalty(&self) {
        self.state.lock().freeze_until = freeze_deadline(self.penalty_freeze);
        log::info!("Player {} penalized for {:?}", self.id, self.penalty_freeze);

        self.table
            .display()
            .notify(DisplayEvent::freeze(self.id, self.penalty_freeze));
    }

    /// Wakes the player out of a pending claim. Returns `false` if no claim
    /// was pending.
    pub fn release(&self) -> bool {
        let mut state = self.state.lock();
        if state.claim != ClaimStatus::Pending {
            return false;
        }
        state.claim = ClaimStatus::Released;
        self.wakeup.notify_all();
        true
    }

    /// Stops the player: every blocking wait of the player and generator
    /// threads returns promptly.
    pub fn terminate(&self) {
        self.terminate.store(true, Ordering::SeqCst);
        self.actions.close();
        // Notify under the lock so a thread between its flag check and its
        // wait cannot miss the signal.
        let _state = self.state.lock();
        self.wakeup.notify_all();
    }
}

fn freeze_deadline(freeze: Duration) -> Option<Instant> {
    (!freeze.is_zero()).then(|| Instant::now() + freeze)
}
