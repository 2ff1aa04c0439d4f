//! State-change notifications for the display.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;

use crate::game::entities::{Card, PlayerId, SlotIndex};

/// Visible state changes pushed to a [`DisplaySink`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DisplayEvent {
    CardPlaced { slot: SlotIndex, card: Card },
    CardRemoved { slot: SlotIndex },
    TokenPlaced { player: PlayerId, slot: SlotIndex },
    TokenRemoved { player: PlayerId, slot: SlotIndex },
    /// Every token on the slot was cleared with its card
    TokensCleared { slot: SlotIndex },
    Score { player: PlayerId, score: u32 },
    /// Remaining freeze; zero means the player is active again
    Freeze { player: PlayerId, remaining_millis: u64 },
    Countdown { remaining_millis: u64, warn: bool },
    Elapsed { elapsed_millis: u64 },
    Winners { players: Vec<PlayerId> },
}

impl DisplayEvent {
    pub fn freeze(player: PlayerId, remaining: Duration) -> Self {
        Self::Freeze {
            player,
            remaining_millis: millis(remaining),
        }
    }

    pub fn countdown(remaining: Duration, warn: bool) -> Self {
        Self::Countdown {
            remaining_millis: millis(remaining),
            warn,
        }
    }

    pub fn elapsed(elapsed: Duration) -> Self {
        Self::Elapsed {
            elapsed_millis: millis(elapsed),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Receiver of display notifications. Called from the dealer and player
/// threads, sometimes while a slot lock is held, so implementations must not
/// block for long or call into the [`Table`](super::slots::Table). Player
/// accessors such as `score` are safe to call.
pub trait DisplaySink: Send + Sync {
    fn notify(&self, event: DisplayEvent);
}

/// Discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn notify(&self, _event: DisplayEvent) {}
}

/// Logs every notification as a JSON line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn notify(&self, event: DisplayEvent) {
        let line = serde_json::to_string(&event).unwrap_or_else(|_| format!("{event:?}"));
        match event {
            DisplayEvent::Winners { .. } | DisplayEvent::Score { .. } => log::info!("{line}"),
            DisplayEvent::Countdown { .. }
            | DisplayEvent::Elapsed { .. }
            | DisplayEvent::Freeze { .. } => log::trace!("{line}"),
            _ => log::debug!("{line}"),
        }
    }
}

/// Keeps every notification in memory, for tests and replay
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    pub fn scores(&self) -> Vec<(PlayerId, u32)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DisplayEvent::Score { player, score } => Some((player, score)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DisplaySink for RecordingDisplay {
    fn notify(&self, event: DisplayEvent) {
        self.events.lock().push(event);
    }
}
