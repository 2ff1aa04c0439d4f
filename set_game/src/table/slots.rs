//! Shared card and token state with one lock per slot.
//!
//! Lock order: a thread holds at most one slot lock at a time, except the
//! dealer, which locks several slots only through [`Table::lock_slots`] and
//! always in ascending slot order.

use parking_lot::{Mutex, MutexGuard};
use std::{collections::BTreeSet, sync::Arc};

use super::{
    config::GameConfig,
    messages::{DisplayEvent, DisplaySink},
};
use crate::game::entities::{Card, PlayerId, SlotIndex};

/// Contents of one table position
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    pub card: Option<Card>,
    pub tokens: BTreeSet<PlayerId>,
}

/// A card taken off the table together with the tokens that sat on it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedCard {
    pub slot: SlotIndex,
    pub card: Card,
    pub displaced: Vec<PlayerId>,
}

/// Outcome of pressing a slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenToggle {
    Placed,
    Removed,
    /// Empty slot, full token set or out-of-range slot
    Ignored,
}

pub struct Table {
    slots: Vec<Mutex<Slot>>,
    claim_size: usize,
    display: Arc<dyn DisplaySink>,
}

impl Table {
    pub fn new(table_size: usize, claim_size: usize, display: Arc<dyn DisplaySink>) -> Self {
        Self {
            slots: (0..table_size).map(|_| Mutex::new(Slot::default())).collect(),
            claim_size,
            display,
        }
    }

    pub fn from_config(config: &GameConfig, display: Arc<dyn DisplaySink>) -> Self {
        Self::new(config.table_size, config.claim_size, display)
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn claim_size(&self) -> usize {
        self.claim_size
    }

    pub(crate) fn display(&self) -> &dyn DisplaySink {
        self.display.as_ref()
    }

    /// Places `player`'s token on `slot`.
    ///
    /// Fails without side effects if the slot is out of range or empty, the
    /// player already has a token there, or already holds `claim_size`
    /// tokens. A player's own placements must come from a single thread:
    /// the token count is read before the slot lock is taken and only the
    /// dealer may lower it concurrently.
    pub fn place_token(&self, player: PlayerId, slot: SlotIndex) -> bool {
        if slot >= self.size() || self.count_tokens_by_player(player) >= self.claim_size {
            return false;
        }

        let mut guard = self.slots[slot].lock();
        if guard.card.is_none() || !guard.tokens.insert(player) {
            return false;
        }
        self.display
            .notify(DisplayEvent::TokenPlaced { player, slot });
        true
    }

    /// Removes `player`'s token from `slot`. Returns whether one was there.
    pub fn remove_token(&self, player: PlayerId, slot: SlotIndex) -> bool {
        let Some(mutex) = self.slots.get(slot) else {
            return false;
        };

        let mut guard = mutex.lock();
        if !guard.tokens.remove(&player) {
            return false;
        }
        self.display
            .notify(DisplayEvent::TokenRemoved { player, slot });
        true
    }

    /// Removes the player's token if present, otherwise tries to place one.
    /// Both halves run under a single acquisition of the slot lock.
    pub fn toggle_token(&self, player: PlayerId, slot: SlotIndex) -> TokenToggle {
        if slot >= self.size() {
            return TokenToggle::Ignored;
        }
        let held = self.count_tokens_by_player(player);

        let mut guard = self.slots[slot].lock();
        if guard.tokens.remove(&player) {
            self.display
                .notify(DisplayEvent::TokenRemoved { player, slot });
            return TokenToggle::Removed;
        }
        if guard.card.is_none() || held >= self.claim_size {
            return TokenToggle::Ignored;
        }
        guard.tokens.insert(player);
        self.display
            .notify(DisplayEvent::TokenPlaced { player, slot });
        TokenToggle::Placed
    }

    /// Puts `card` on an empty slot. Returns `false` if the slot is out of
    /// range or already holds a card.
    pub fn deal_card(&self, slot: SlotIndex, card: Card) -> bool {
        let Some(mutex) = self.slots.get(slot) else {
            return false;
        };

        let mut guard = mutex.lock();
        if guard.card.is_some() {
            return false;
        }
        guard.card = Some(card);
        self.display.notify(DisplayEvent::CardPlaced { slot, card });
        true
    }

    /// Takes the card off `slot`, clearing every token on it.
    pub fn remove_card(&self, slot: SlotIndex) -> Option<RemovedCard> {
        let mutex = self.slots.get(slot)?;
        let mut guard = mutex.lock();
        take_card(slot, &mut guard, self.display.as_ref())
    }

    /// Takes the cards off all `slots` while holding every one of their
    /// locks. Empty slots are skipped.
    pub fn remove_cards(&self, slots: &[SlotIndex]) -> Vec<RemovedCard> {
        self.lock_slots(slots).remove_cards()
    }

    /// Locks the given slots in ascending order. Duplicates and out-of-range
    /// indices are dropped.
    pub fn lock_slots(&self, slots: &[SlotIndex]) -> LockedSlots<'_> {
        let ordered: BTreeSet<SlotIndex> = slots
            .iter()
            .copied()
            .filter(|&slot| slot < self.size())
            .collect();
        let guards = ordered
            .into_iter()
            .map(|slot| (slot, self.slots[slot].lock()))
            .collect();
        LockedSlots {
            guards,
            display: self.display.as_ref(),
        }
    }

    pub fn card_at(&self, slot: SlotIndex) -> Option<Card> {
        self.slots.get(slot).and_then(|mutex| mutex.lock().card)
    }

    pub fn has_token(&self, player: PlayerId, slot: SlotIndex) -> bool {
        self.slots
            .get(slot)
            .is_some_and(|mutex| mutex.lock().tokens.contains(&player))
    }

    /// Slots holding `player`'s tokens, ascending.
    pub fn tokens_of(&self, player: PlayerId) -> Vec<SlotIndex> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, mutex)| mutex.lock().tokens.contains(&player))
            .map(|(slot, _)| slot)
            .collect()
    }

    pub fn count_tokens_by_player(&self, player: PlayerId) -> usize {
        self.slots
            .iter()
            .filter(|mutex| mutex.lock().tokens.contains(&player))
            .count()
    }

    pub fn count_cards(&self) -> usize {
        self.slots
            .iter()
            .filter(|mutex| mutex.lock().card.is_some())
            .count()
    }

    /// Dealt cards with their slots, ascending by slot.
    pub fn cards(&self) -> Vec<(SlotIndex, Card)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, mutex)| mutex.lock().card.map(|card| (slot, card)))
            .collect()
    }

    pub fn empty_slots(&self) -> Vec<SlotIndex> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, mutex)| mutex.lock().card.is_none())
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Copy of every slot. Each slot is read atomically; the whole table is
    /// not.
    pub fn snapshot(&self) -> Vec<Slot> {
        self.slots.iter().map(|mutex| mutex.lock().clone()).collect()
    }
}

/// Several slot locks held at once, acquired in ascending slot order
pub struct LockedSlots<'a> {
    guards: Vec<(SlotIndex, MutexGuard<'a, Slot>)>,
    display: &'a dyn DisplaySink,
}

impl LockedSlots<'_> {
    pub fn slots(&self) -> Vec<SlotIndex> {
        self.guards.iter().map(|(slot, _)| *slot).collect()
    }

    /// Cards on the locked slots, or `None` if any of them is empty.
    pub fn cards(&self) -> Option<Vec<Card>> {
        self.guards.iter().map(|(_, guard)| guard.card).collect()
    }

    pub fn remove_cards(mut self) -> Vec<RemovedCard> {
        let display = self.display;
        self.guards
            .iter_mut()
            .filter_map(|(slot, guard)| take_card(*slot, guard, display))
            .collect()
    }
}

fn take_card(slot: SlotIndex, guard: &mut Slot, display: &dyn DisplaySink) -> Option<RemovedCard> {
    let card = guard.card.take()?;
    let displaced: Vec<PlayerId> = std::mem::take(&mut guard.tokens).into_iter().collect();
    if !displaced.is_empty() {
        display.notify(DisplayEvent::TokensCleared { slot });
    }
    display.notify(DisplayEvent::CardRemoved { slot });
    Some(RemovedCard {
        slot,
        card,
        displaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::messages::{NullDisplay, RecordingDisplay};

    fn table(size: usize) -> Table {
        let table = Table::new(size, 3, Arc::new(NullDisplay));
        for slot in 0..size {
            assert!(table.deal_card(slot, Card(slot as u32)));
        }
        table
    }

    #[test]
    fn test_place_and_remove_token() {
        let table = table(4);
        assert!(table.place_token(0, 1));
        assert!(!table.place_token(0, 1), "Second placement must fail");
        assert!(table.has_token(0, 1));
        assert!(table.remove_token(0, 1));
        assert!(!table.remove_token(0, 1));
        assert_eq!(table.count_tokens_by_player(0), 0);
    }

    #[test]
    fn test_place_token_on_empty_slot_fails() {
        let table = Table::new(4, 3, Arc::new(NullDisplay));
        assert!(!table.place_token(0, 2));
        assert!(!table.place_token(0, 99));
    }

    #[test]
    fn test_token_limit_is_claim_size() {
        let table = table(6);
        for slot in 0..3 {
            assert!(table.place_token(7, slot));
        }
        assert!(!table.place_token(7, 3));
        assert_eq!(table.toggle_token(7, 4), TokenToggle::Ignored);
        assert_eq!(table.count_tokens_by_player(7), 3);

        // Removing one frees room for another
        assert_eq!(table.toggle_token(7, 0), TokenToggle::Removed);
        assert_eq!(table.toggle_token(7, 4), TokenToggle::Placed);
        assert_eq!(table.tokens_of(7), vec![1, 2, 4]);
    }

    #[test]
    fn test_remove_card_clears_all_tokens() {
        let display = Arc::new(RecordingDisplay::new());
        let table = Table::new(3, 3, display.clone());
        table.deal_card(2, Card(11));
        table.place_token(0, 2);
        table.place_token(1, 2);

        let removed = table.remove_card(2).expect("card was dealt");
        assert_eq!(removed.card, Card(11));
        assert_eq!(removed.displaced, vec![0, 1]);
        assert_eq!(table.count_tokens_by_player(0), 0);
        assert!(table.card_at(2).is_none());
        assert!(
            display
                .events()
                .contains(&DisplayEvent::TokensCleared { slot: 2 })
        );
        assert!(table.remove_card(2).is_none());
    }

    #[test]
    fn test_deal_card_refuses_occupied_slot() {
        let table = table(2);
        assert!(!table.deal_card(0, Card(40)));
        assert_eq!(table.card_at(0), Some(Card(0)));
    }

    #[test]
    fn test_lock_slots_orders_and_dedups() {
        let table = table(5);
        let locked = table.lock_slots(&[4, 1, 4, 9, 2]);
        assert_eq!(locked.slots(), vec![1, 2, 4]);
        assert_eq!(locked.cards(), Some(vec![Card(1), Card(2), Card(4)]));
    }

    #[test]
    fn test_remove_cards_reports_each_slot() {
        let table = table(5);
        table.place_token(3, 0);
        let removed = table.remove_cards(&[3, 0]);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].slot, 0);
        assert_eq!(removed[0].displaced, vec![3]);
        assert_eq!(table.count_cards(), 3);
        assert_eq!(table.empty_slots(), vec![0, 3]);
    }

    #[test]
    fn test_concurrent_toggles_on_same_slot_are_serialized() {
        let table = Arc::new(table(1));
        let handles: Vec<_> = (0..8)
            .map(|player| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for _ in 0..101 {
                        table.toggle_token(player, 0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("toggle thread panicked");
        }

        // Odd number of toggles each: every player ends with a token.
        let snapshot = table.snapshot();
        assert_eq!(snapshot[0].tokens.len(), 8);
    }

    #[test]
    fn test_concurrent_toggles_on_different_slots() {
        let table = Arc::new(table(2));
        let handles: Vec<_> = (0..2)
            .map(|player| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    (0..1000)
                        .filter(|_| table.toggle_token(player, player) == TokenToggle::Placed)
                        .count()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("toggle thread panicked"), 500);
        }

        assert_eq!(table.tokens_of(0), Vec::<SlotIndex>::new());
        assert_eq!(table.tokens_of(1), Vec::<SlotIndex>::new());
    }
}
