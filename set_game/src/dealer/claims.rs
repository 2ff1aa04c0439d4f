//! FIFO of players waiting for the dealer's verdict.

use parking_lot::{Condvar, Mutex};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::game::entities::PlayerId;

#[derive(Debug, Default)]
struct ClaimState {
    queue: VecDeque<PlayerId>,
    closed: bool,
}

/// Shared claim queue. Any player thread pushes; only the dealer pops.
#[derive(Debug, Default)]
pub struct ClaimQueue {
    state: Mutex<ClaimState>,
    available: Condvar,
}

impl ClaimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a claim. Returns `false` if the queue is closed or the
    /// player already has a claim queued.
    pub fn push(&self, player: PlayerId) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        if state.queue.contains(&player) {
            log::warn!("Player {player} already has a claim queued");
            return false;
        }
        state.queue.push_back(player);
        self.available.notify_all();
        true
    }

    /// Pops the oldest claim, waiting up to `timeout` for one to arrive.
    /// Returns `None` on timeout or once the queue is closed.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<PlayerId> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(player) = state.queue.pop_front() {
                return Some(player);
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return if state.closed {
                    None
                } else {
                    state.queue.pop_front()
                };
            }
        }
    }

    pub fn try_pop(&self) -> Option<PlayerId> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.queue.pop_front()
    }

    /// Removes and returns every queued claim, oldest first.
    pub fn drain(&self) -> Vec<PlayerId> {
        self.state.lock().queue.drain(..).collect()
    }

    /// Sleeps for `timeout` unless the queue is closed first. Returns whether
    /// the queue is closed.
    pub fn wait_closed(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.closed {
            if self.available.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.closed
    }

    /// Rejects further claims and wakes the dealer. Queued claims stay until
    /// drained.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.state.lock().queue.contains(&player)
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
