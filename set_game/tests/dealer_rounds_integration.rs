//! Dealer round rules: reshuffle when the table holds no match, early
//! reshuffle after a claim, game end and shutdown order.

use set_game::{
    Card, Deck, FeatureSpace, GameConfig, GameHandle, dealer::Dealer, table::RecordingDisplay,
};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

const WAIT: Duration = Duration::from_secs(5);

/// One-minute countdown: any round shorter than `WAIT` ended by rule.
fn config(players: usize) -> GameConfig {
    GameConfig {
        players,
        human_players: players,
        table_size: 6,
        claim_size: 3,
        feature_size: 3,
        feature_count: 3,
        turn_timeout_millis: 60_000,
        point_freeze_millis: 0,
        penalty_freeze_millis: 0,
        table_delay_millis: 0,
        end_game_pause_millis: 0,
        ui_tick_millis: 10,
        ..Default::default()
    }
}

fn card(values: [u8; 3]) -> Card {
    FeatureSpace::new(3, 3)
        .card(&values)
        .expect("features in range")
}

fn cards(values: &[[u8; 3]]) -> Vec<Card> {
    values.iter().map(|&v| card(v)).collect()
}

/// Cards using only values 0 and 1 never hold a match of three.
fn two_valued() -> Vec<Card> {
    cards(&[[0, 0, 0], [0, 0, 1], [0, 1, 0], [0, 1, 1], [1, 0, 0], [1, 0, 1]])
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_round_without_match_ends_at_once() {
    let display = Arc::new(RecordingDisplay::new());
    let mut dealer = Dealer::new(config(1), display)
        .expect("valid config")
        .with_deck(Deck::from_cards(two_valued()));
    dealer.start_players().expect("player threads start");

    let started = Instant::now();
    dealer.play_round();

    assert!(started.elapsed() < WAIT, "Round waited for the countdown");
    assert_eq!(dealer.table().count_cards(), 0);
    assert_eq!(dealer.deck().len(), 6);

    dealer.terminate_players();
}

#[test]
fn test_claim_leaving_no_match_ends_round_early() {
    let display = Arc::new(RecordingDisplay::new());
    let mut dealer = Dealer::new(config(1), display.clone())
        .expect("valid config")
        .with_deck(Deck::from_cards(cards(&[[1, 0, 0], [1, 0, 1], [1, 1, 0]])));
    // 000, 111, 222 is the only match on this table
    let dealt = cards(&[[0, 0, 0], [1, 1, 1], [2, 2, 2], [0, 0, 1], [0, 1, 0], [0, 1, 1]]);
    for (slot, &card) in dealt.iter().enumerate() {
        assert!(dealer.table().deal_card(slot, card));
    }
    dealer.start_players().expect("player threads start");
    let player = Arc::clone(&dealer.players()[0]);

    let started = Instant::now();
    let round = thread::spawn(move || {
        dealer.play_round();
        dealer
    });

    for slot in 0..3 {
        assert!(player.key_pressed(slot));
    }
    assert!(wait_until(|| round.is_finished()), "Round did not end");
    let mut dealer = round.join().expect("dealer thread");

    assert!(started.elapsed() < WAIT);
    assert_eq!(player.score(), 1);
    assert!(display.scores().contains(&(0, 1)));
    // Replacements plus the untouched cards, all back in the deck
    assert_eq!(dealer.table().count_cards(), 0);
    assert_eq!(dealer.deck().len(), 6);

    dealer.terminate_players();
}

#[test]
fn test_game_ends_when_last_match_is_claimed() {
    let dealer = Dealer::new(config(1), Arc::new(RecordingDisplay::new()))
        .expect("valid config")
        .with_deck(Deck::from_cards(cards(&[[0, 0, 0], [1, 1, 1], [2, 2, 2]])));
    let game = GameHandle::spawn(dealer).expect("game starts");
    let table = Arc::clone(game.table());

    assert!(wait_until(|| table.count_cards() == 3));
    for (slot, _) in table.cards() {
        assert!(matches!(game.key_pressed(0, slot), Ok(true)));
    }

    assert!(wait_until(|| game.is_finished()), "Game did not end");
    let summary = game.join().expect("dealer exits cleanly");
    assert_eq!(summary.scores, vec![1]);
    assert_eq!(summary.winners, vec![0]);
}

#[test]
fn test_game_without_any_match_ends_immediately() {
    let dealer = Dealer::new(config(2), Arc::new(RecordingDisplay::new()))
        .expect("valid config")
        .with_deck(Deck::from_cards(two_valued()));

    let started = Instant::now();
    let summary = dealer.run();

    assert!(started.elapsed() < WAIT);
    assert_eq!(summary.scores, vec![0, 0]);
    assert_eq!(summary.winners, vec![0, 1]);
}

#[test]
fn test_players_terminate_in_reverse_order() {
    let mut dealer = Dealer::new(config(3), Arc::new(RecordingDisplay::new()))
        .expect("valid config");
    dealer.start_players().expect("player threads start");
    let players: Vec<_> = dealer.players().to_vec();

    assert_eq!(dealer.terminate_players(), vec![2, 1, 0]);
    assert!(players.iter().all(|player| player.is_terminated()));
}
