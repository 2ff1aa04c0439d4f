//! Dealer thread: deals cards, runs the round timer and rules on claims.

use rand::seq::SliceRandom;
use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use super::claims::ClaimQueue;
use crate::{
    game::{
        entities::{Card, Deck, FeatureSpace, PlayerId, SlotIndex},
        errors::{ConfigResult, GameError, GameResult},
        functional,
    },
    player::{actor::Player, models::ClaimOutcome},
    table::{
        config::{GameConfig, StaleClaimPolicy, TimerMode},
        messages::{DisplayEvent, DisplaySink},
        slots::Table,
    },
};

/// Final standings
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    /// Score per player id
    pub scores: Vec<u32>,
    /// Every player sharing the top score
    pub winners: Vec<PlayerId>,
}

/// Requests dealer shutdown from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    claims: Arc<ClaimQueue>,
}

impl ShutdownHandle {
    /// Sets the terminate flag and wakes the dealer if it is waiting for
    /// claims or pausing between cards.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.claims.close();
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The single writer of card state and the only caller of `point`,
/// `penalty` and `release`.
pub struct Dealer {
    config: GameConfig,
    space: FeatureSpace,
    table: Arc<Table>,
    players: Vec<Arc<Player>>,
    player_threads: Vec<JoinHandle<()>>,
    deck: Deck,
    claims: Arc<ClaimQueue>,
    terminate: Arc<AtomicBool>,
    display: Arc<dyn DisplaySink>,
    round_started: Instant,
    reshuffle_at: Option<Instant>,
}

impl Dealer {
    /// Builds the table, the claim queue and every player. No thread starts
    /// until [`Dealer::run`].
    pub fn new(config: GameConfig, display: Arc<dyn DisplaySink>) -> ConfigResult<Self> {
        config.validate()?;

        let space = config.feature_space();
        let table = Arc::new(Table::from_config(&config, Arc::clone(&display)));
        let claims = Arc::new(ClaimQueue::new());
        let players = (0..config.players)
            .map(|id| {
                Arc::new(Player::new(
                    id,
                    config.is_human(id),
                    &config,
                    Arc::clone(&table),
                    Arc::clone(&claims),
                ))
            })
            .collect();
        let deck = Deck::new(&space, config.random_seed);

        Ok(Self {
            config,
            space,
            table,
            players,
            player_threads: Vec::new(),
            deck,
            claims,
            terminate: Arc::new(AtomicBool::new(false)),
            display,
            round_started: Instant::now(),
            reshuffle_at: None,
        })
    }

    /// Replaces the shuffled deck, e.g. with a fixed deal order.
    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn players(&self) -> &[Arc<Player>] {
        &self.players
    }

    pub fn claims(&self) -> &Arc<ClaimQueue> {
        &self.claims
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.terminate),
            claims: Arc::clone(&self.claims),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    /// Runs the game to completion on the calling thread.
    pub fn run(mut self) -> GameSummary {
        log::info!(
            "Dealer starting: {} players, {} slots, deck of {}",
            self.players.len(),
            self.table.size(),
            self.deck.len()
        );

        if let Err(e) = self.start_players() {
            log::error!("Dealer: {e}");
            self.terminate.store(true, Ordering::SeqCst);
        }

        while !self.should_finish() {
            self.play_round();
        }

        let summary = self.summary();
        self.announce_winners(&summary);
        self.terminate_players();
        log::info!("Dealer finished, scores {:?}", summary.scores);
        summary
    }

    /// Deals, rules on claims until the round ends, then collects the table.
    pub fn play_round(&mut self) {
        self.place_cards_on_table();
        self.reset_round_timer();
        self.timer_loop();
        self.update_timer_display();
        self.remove_all_cards_from_table();
    }

    /// Starts every player thread in creation order.
    pub fn start_players(&mut self) -> GameResult<()> {
        for player in &self.players {
            let handle = player.spawn().map_err(|source| GameError::Spawn {
                name: format!("player-{}", player.id()),
                source,
            })?;
            self.player_threads.push(handle);
        }
        Ok(())
    }

    /// The game ends on request or when no match is left among every card
    /// still in play.
    fn should_finish(&self) -> bool {
        if self.is_terminated() {
            return true;
        }
        let mut pool: Vec<Card> = self.deck.cards().to_vec();
        pool.extend(self.table.cards().into_iter().map(|(_, card)| card));
        match functional::has_match_while(&self.space, &pool, self.config.claim_size, || {
            !self.is_terminated()
        }) {
            Some(true) => false,
            Some(false) => {
                log::info!("No match left among {} cards in play", pool.len());
                true
            }
            None => true,
        }
    }

    fn table_has_match(&self) -> bool {
        let cards: Vec<Card> = self
            .table
            .cards()
            .into_iter()
            .map(|(_, card)| card)
            .collect();
        // An interrupted search counts as a match so the round ends on the
        // terminate flag rather than on a reshuffle.
        functional::has_match_while(&self.space, &cards, self.config.claim_size, || {
            !self.is_terminated()
        })
        .unwrap_or(true)
    }

    /// Fills empty slots from the deck in random order. Returns the number of
    /// cards dealt.
    pub fn place_cards_on_table(&mut self) -> usize {
        let mut empty = self.table.empty_slots();
        empty.shuffle(self.deck.rng());

        let mut dealt = 0;
        for slot in empty {
            if self.is_terminated() {
                break;
            }
            let Some(card) = self.deck.draw() else {
                break;
            };
            if self.table.deal_card(slot, card) {
                dealt += 1;
            } else {
                self.deck.return_cards([card]);
            }
            self.pause(self.config.table_delay());
        }

        log::debug!("Dealt {} cards, {} left in deck", dealt, self.deck.len());
        if self.config.hints {
            self.log_hints();
        }
        dealt
    }

    /// Rules on outstanding claims, then collects every card back into the
    /// deck and reshuffles. Claims registered during collection are stale.
    pub fn remove_all_cards_from_table(&mut self) -> usize {
        if !self.is_terminated() {
            self.process_claims();
        }

        let mut slots: Vec<SlotIndex> = self
            .table
            .cards()
            .into_iter()
            .map(|(slot, _)| slot)
            .collect();
        slots.shuffle(self.deck.rng());

        let mut collected = 0;
        for slot in slots {
            if let Some(removed) = self.table.remove_card(slot) {
                self.deck.return_cards([removed.card]);
                collected += 1;
            }
            if !self.is_terminated() {
                self.pause(self.config.table_delay());
            }
        }
        self.deck.shuffle();

        for id in self.claims.drain() {
            let Some(player) = self.players.get(id).cloned() else {
                continue;
            };
            if self.is_terminated() {
                log::debug!("Player {id} claim released by shutdown");
                player.release();
            } else {
                self.stale_claim(&player);
            }
        }

        log::debug!("Collected {} cards, deck now {}", collected, self.deck.len());
        collected
    }

    /// Rules on every claim queued right now, oldest first.
    pub fn process_claims(&mut self) -> Vec<(PlayerId, ClaimOutcome)> {
        let mut outcomes = Vec::new();
        while let Some(id) = self.claims.try_pop() {
            outcomes.push((id, self.verify_claim(id)));
        }
        outcomes
    }

    /// Rules on one claim and releases the claimant once every table change
    /// is committed.
    pub fn verify_claim(&mut self, id: PlayerId) -> ClaimOutcome {
        let Some(player) = self.players.get(id).cloned() else {
            log::warn!("Dealer: claim from unknown player {id}");
            return ClaimOutcome::Stale;
        };

        let slots = self.table.tokens_of(id);
        if slots.len() != self.config.claim_size {
            return self.stale_claim(&player);
        }

        let table = Arc::clone(&self.table);
        let locked = table.lock_slots(&slots);
        let Some(cards) = locked.cards() else {
            drop(locked);
            return self.stale_claim(&player);
        };

        if !functional::cards_match(&self.space, &cards) {
            drop(locked);
            log::debug!("Player {id} claimed {cards:?}: no match");
            player.penalty();
            player.release();
            return ClaimOutcome::Rejected;
        }

        let removed = locked.remove_cards();
        for entry in &removed {
            let others: Vec<PlayerId> = entry
                .displaced
                .iter()
                .copied()
                .filter(|&other| other != id)
                .collect();
            if !others.is_empty() {
                log::debug!("Slot {} cleared tokens of {:?}", entry.slot, others);
            }
        }
        log::debug!("Player {id} claimed {cards:?}: match");

        player.point();
        for &slot in &slots {
            match self.deck.draw() {
                Some(card) => {
                    self.table.deal_card(slot, card);
                }
                None => break,
            }
        }
        self.reset_round_timer();
        player.release();

        ClaimOutcome::Accepted { slots }
    }

    fn stale_claim(&self, player: &Player) -> ClaimOutcome {
        log::debug!(
            "Player {} claim is stale ({})",
            player.id(),
            self.config.stale_claim_policy
        );
        if self.config.stale_claim_policy == StaleClaimPolicy::Penalize {
            player.penalty();
        }
        player.release();
        ClaimOutcome::Stale
    }

    /// Drains claims until the round ends: the countdown expires, the table
    /// runs out of matches, or shutdown is requested.
    fn timer_loop(&mut self) {
        if !self.table_has_match() {
            log::debug!("No match on the table, reshuffling");
            return;
        }

        while !self.is_terminated() && !self.round_expired() {
            self.update_timer_display();
            let Some(id) = self.claims.pop_timeout(self.next_wake()) else {
                continue;
            };

            if let ClaimOutcome::Accepted { .. } = self.verify_claim(id) {
                if !self.table_has_match() {
                    if self.deck.is_empty() {
                        log::info!("Deck exhausted and no match on the table");
                    } else {
                        log::debug!("No match on the table, reshuffling early");
                    }
                    return;
                }
            }
        }
    }

    fn reset_round_timer(&mut self) {
        let now = Instant::now();
        self.round_started = now;
        self.reshuffle_at = match self.config.timer_mode() {
            TimerMode::Countdown(timeout) => Some(now + timeout),
            TimerMode::Elapsed | TimerMode::Disabled => None,
        };
    }

    fn round_expired(&self) -> bool {
        self.reshuffle_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn next_wake(&self) -> Duration {
        let tick = self.config.ui_tick();
        match self.reshuffle_at {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(tick),
            None => tick,
        }
    }

    fn update_timer_display(&self) {
        let now = Instant::now();
        match self.config.timer_mode() {
            TimerMode::Countdown(_) => {
                let remaining = self
                    .reshuffle_at
                    .map_or(Duration::ZERO, |deadline| {
                        deadline.saturating_duration_since(now)
                    });
                let warn = remaining <= self.config.turn_timeout_warning();
                self.display
                    .notify(DisplayEvent::countdown(remaining, warn));
            }
            TimerMode::Elapsed => {
                self.display.notify(DisplayEvent::elapsed(
                    now.saturating_duration_since(self.round_started),
                ));
            }
            TimerMode::Disabled => {}
        }
    }

    /// Interruptible sleep between dealt cards.
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            self.claims.wait_closed(duration);
        }
    }

    fn log_hints(&self) {
        let cards: Vec<Card> = self
            .table
            .cards()
            .into_iter()
            .map(|(_, card)| card)
            .collect();
        for group in functional::find_matches(&self.space, &cards, self.config.claim_size, usize::MAX)
        {
            let features: Vec<String> = group
                .iter()
                .map(|&card| self.space.features(card).to_string())
                .collect();
            log::info!("Hint: {:?} {}", group, features.join(" "));
        }
    }

    pub fn summary(&self) -> GameSummary {
        let scores: Vec<u32> = self.players.iter().map(|p| p.score()).collect();
        let top = scores.iter().copied().max().unwrap_or(0);
        let winners = scores
            .iter()
            .enumerate()
            .filter(|&(_, &score)| score == top)
            .map(|(id, _)| id)
            .collect();
        GameSummary { scores, winners }
    }

    fn announce_winners(&self, summary: &GameSummary) {
        log::info!("Winners: {:?}", summary.winners);
        self.display.notify(DisplayEvent::Winners {
            players: summary.winners.clone(),
        });
        if !self.is_terminated() {
            self.pause(self.config.end_game_pause());
        }
    }

    /// Terminates and joins every player in reverse creation order. Players
    /// blocked on a claim are released without a verdict. Returns the ids in
    /// the order they were terminated.
    pub fn terminate_players(&mut self) -> Vec<PlayerId> {
        self.terminate.store(true, Ordering::SeqCst);
        self.claims.close();

        let mut threads = std::mem::take(&mut self.player_threads);
        let mut order = Vec::with_capacity(self.players.len());
        for player in self.players.iter().rev() {
            player.terminate();
            order.push(player.id());
            // Threads were started in id order, so the last handle is this
            // player's unless its thread never started.
            if threads.len() > player.id() {
                if let Some(handle) = threads.pop() {
                    if handle.join().is_err() {
                        log::error!("Player {} thread panicked", player.id());
                    }
                }
            }
        }
        log::info!("All players terminated");
        order
    }
}
