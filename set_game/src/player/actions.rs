//! Bounded queue of pending slot presses.

use parking_lot::{Condvar, Mutex};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::game::entities::SlotIndex;

#[derive(Debug, Default)]
struct QueueState {
    presses: VecDeque<SlotIndex>,
    closed: bool,
}

/// Blocking FIFO of key presses with a fixed capacity.
///
/// `put` blocks while the queue is full and `take` while it is empty. Once
/// [`ActionQueue::close`] is called every blocked caller returns and all
/// further operations fail.
#[derive(Debug)]
pub struct ActionQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
    not_full: Condvar,
    closing: Condvar,
    capacity: usize,
}

impl ActionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            closing: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a press, blocking while the queue is full. Returns `false` if
    /// the queue was closed.
    pub fn put(&self, slot: SlotIndex) -> bool {
        let mut state = self.state.lock();
        while state.presses.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return false;
        }
        state.presses.push_back(slot);
        self.not_empty.notify_one();
        true
    }

    /// Appends a press unless the queue is full or closed.
    pub fn try_put(&self, slot: SlotIndex) -> bool {
        let mut state = self.state.lock();
        if state.closed || state.presses.len() >= self.capacity {
            return false;
        }
        state.presses.push_back(slot);
        self.not_empty.notify_one();
        true
    }

    /// Removes the oldest press, blocking while the queue is empty. Returns
    /// `None` once the queue is closed, even if presses remain.
    pub fn take(&self) -> Option<SlotIndex> {
        let mut state = self.state.lock();
        while state.presses.is_empty() && !state.closed {
            self.not_empty.wait(&mut state);
        }
        if state.closed {
            return None;
        }
        let slot = state.presses.pop_front();
        self.not_full.notify_one();
        slot
    }

    /// Sleeps for `timeout` unless the queue is closed first. Returns whether
    /// the queue is closed.
    pub fn wait_closed(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.closed {
            if self.closing.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.closed
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
        self.closing.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().presses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn test_fifo_order() {
        let queue = ActionQueue::new(3);
        assert!(queue.put(4));
        assert!(queue.put(1));
        assert!(queue.put(7));
        assert_eq!(queue.take(), Some(4));
        assert_eq!(queue.take(), Some(1));
        assert_eq!(queue.take(), Some(7));
    }

    #[test]
    fn test_try_put_respects_capacity() {
        let queue = ActionQueue::new(2);
        assert!(queue.try_put(0));
        assert!(queue.try_put(1));
        assert!(!queue.try_put(2));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_put_blocks_until_take() {
        let queue = Arc::new(ActionQueue::new(1));
        assert!(queue.put(0));

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.put(1))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.len(), 1, "Producer must still be blocked");
        assert_eq!(queue.take(), Some(0));
        assert!(producer.join().expect("producer panicked"));
        assert_eq!(queue.take(), Some(1));
    }

    #[test]
    fn test_close_wakes_blocked_take() {
        let queue = Arc::new(ActionQueue::new(1));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.take())
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert_eq!(consumer.join().expect("consumer panicked"), None);
        assert!(!queue.put(3));
    }

    #[test]
    fn test_close_wakes_blocked_put() {
        let queue = Arc::new(ActionQueue::new(1));
        queue.put(0);
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.put(1))
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert!(!producer.join().expect("producer panicked"));
    }

    #[test]
    fn test_wait_closed_returns_early_on_close() {
        let queue = Arc::new(ActionQueue::new(1));
        let sleeper = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let started = Instant::now();
                let closed = queue.wait_closed(Duration::from_secs(30));
                (closed, started.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        let (closed, elapsed) = sleeper.join().expect("sleeper panicked");
        assert!(closed);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_wait_closed_times_out() {
        let queue = ActionQueue::new(1);
        assert!(!queue.wait_closed(Duration::from_millis(10)));
    }
}
