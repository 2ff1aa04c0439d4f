//! Pure matching rules.
//!
//! A group of cards matches when, on every feature channel, the values are
//! either all identical or all pairwise distinct. Nothing here touches shared
//! state, so these functions are safe to call from any thread.

use std::collections::HashSet;

use super::entities::{Card, FeatureSpace, Features};

/// Returns `true` if the feature tuples form a match.
///
/// Fewer than two tuples never match, and tuples of differing length never
/// match.
pub fn is_match(group: &[Features]) -> bool {
    let Some(first) = group.first() else {
        return false;
    };
    if group.len() < 2 || group.iter().any(|f| f.channels() != first.channels()) {
        return false;
    }

    (0..first.channels()).all(|channel| {
        let values: HashSet<u8> = group.iter().map(|f| f.0[channel]).collect();
        values.len() == 1 || values.len() == group.len()
    })
}

/// Returns `true` if the cards form a match under `space`.
pub fn cards_match(space: &FeatureSpace, cards: &[Card]) -> bool {
    let features: Vec<Features> = cards.iter().map(|&card| space.features(card)).collect();
    is_match(&features)
}

/// Groups examined between two polls of a search's `keep_going` callback
const POLL_INTERVAL: usize = 1 << 12;

/// Finds up to `limit` groups of `group_size` cards that match.
///
/// Groups are reported with cards in the order they appear in `cards`.
pub fn find_matches(
    space: &FeatureSpace,
    cards: &[Card],
    group_size: usize,
    limit: usize,
) -> Vec<Vec<Card>> {
    search(space, cards, group_size, limit, || true).0
}

/// Interruptible [`find_matches`]: returns the groups found so far once
/// `keep_going` returns `false`. The callback is polled before the first
/// group and then every few thousand groups.
pub fn find_matches_while(
    space: &FeatureSpace,
    cards: &[Card],
    group_size: usize,
    limit: usize,
    keep_going: impl FnMut() -> bool,
) -> Vec<Vec<Card>> {
    search(space, cards, group_size, limit, keep_going).0
}

/// Returns `true` if at least one match exists among `cards`.
pub fn has_match(space: &FeatureSpace, cards: &[Card], group_size: usize) -> bool {
    has_match_while(space, cards, group_size, || true).unwrap_or(false)
}

/// Interruptible [`has_match`]. Returns `None` if `keep_going` stopped the
/// search before it reached an answer.
pub fn has_match_while(
    space: &FeatureSpace,
    cards: &[Card],
    group_size: usize,
    keep_going: impl FnMut() -> bool,
) -> Option<bool> {
    if group_size == 3 && space.feature_size == 3 {
        return has_triple_while(space, cards, keep_going);
    }
    match search(space, cards, group_size, 1, keep_going) {
        (found, _) if !found.is_empty() => Some(true),
        (_, true) => Some(false),
        (_, false) => None,
    }
}

/// Combination search in lexicographic order. The flag is `false` when
/// `keep_going` cut the search short.
fn search(
    space: &FeatureSpace,
    cards: &[Card],
    group_size: usize,
    limit: usize,
    mut keep_going: impl FnMut() -> bool,
) -> (Vec<Vec<Card>>, bool) {
    let mut found = Vec::new();
    if limit == 0 || group_size < 2 || group_size > cards.len() {
        return (found, true);
    }

    let features: Vec<Features> = cards.iter().map(|&card| space.features(card)).collect();
    let mut indices: Vec<usize> = (0..group_size).collect();
    let mut group = Vec::with_capacity(group_size);

    for examined in 0usize.. {
        if examined % POLL_INTERVAL == 0 && !keep_going() {
            return (found, false);
        }

        group.clear();
        group.extend(indices.iter().map(|&i| features[i].clone()));
        if is_match(&group) {
            found.push(indices.iter().map(|&i| cards[i]).collect());
            if found.len() == limit {
                break;
            }
        }

        // Advance to the next combination in lexicographic order.
        let Some(pos) = (0..group_size)
            .rev()
            .find(|&pos| indices[pos] < cards.len() - group_size + pos)
        else {
            break;
        };
        indices[pos] += 1;
        for next in pos + 1..group_size {
            indices[next] = indices[next - 1] + 1;
        }
    }
    (found, true)
}

/// With three values per channel, two distinct cards determine the only third
/// card completing them: per channel, the value making the sum divisible by
/// three. Quadratic in the number of cards.
fn has_triple_while(
    space: &FeatureSpace,
    cards: &[Card],
    mut keep_going: impl FnMut() -> bool,
) -> Option<bool> {
    let present: HashSet<Card> = cards.iter().copied().collect();
    let features: Vec<Features> = cards.iter().map(|&card| space.features(card)).collect();

    for (i, a) in features.iter().enumerate() {
        if !keep_going() {
            return None;
        }
        for b in &features[i + 1..] {
            if a == b {
                continue;
            }
            let third: Vec<u8> = a
                .0
                .iter()
                .zip(&b.0)
                .map(|(&x, &y)| (6 - x - y) % 3)
                .collect();
            if space.card(&third).is_some_and(|card| present.contains(&card)) {
                return Some(true);
            }
        }
    }
    Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(values: &[u8]) -> Features {
        Features(values.to_vec())
    }

    #[test]
    fn test_all_same_on_every_channel_except_one() {
        assert!(is_match(&[f(&[0, 0, 0]), f(&[0, 0, 1]), f(&[0, 0, 2])]));
    }

    #[test]
    fn test_all_different_on_every_channel() {
        assert!(is_match(&[f(&[0, 0, 0]), f(&[1, 1, 1]), f(&[2, 2, 2])]));
    }

    #[test]
    fn test_two_same_one_different_is_not_a_match() {
        assert!(!is_match(&[f(&[0, 0, 0]), f(&[0, 0, 1]), f(&[1, 1, 1])]));
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = [f(&[0, 1, 2]), f(&[1, 1, 0]), f(&[2, 1, 1])];
        let b = [a[2].clone(), a[0].clone(), a[1].clone()];
        assert_eq!(is_match(&a), is_match(&b));
        assert!(is_match(&a));
    }

    #[test]
    fn test_degenerate_groups() {
        assert!(!is_match(&[]));
        assert!(!is_match(&[f(&[0, 0])]));
        assert!(!is_match(&[f(&[0, 0]), f(&[0, 0, 0])]));
    }

    #[test]
    fn test_larger_claims() {
        // Four cards over a four-value alphabet.
        assert!(is_match(&[f(&[0, 3]), f(&[1, 3]), f(&[2, 3]), f(&[3, 3])]));
        assert!(!is_match(&[f(&[0, 3]), f(&[1, 3]), f(&[1, 3]), f(&[3, 3])]));
    }

    #[test]
    fn test_find_matches_in_full_small_deck() {
        // 3 values, 2 channels: 9 cards, 12 matching lines.
        let space = FeatureSpace::new(3, 2);
        let cards: Vec<Card> = space.all_cards().collect();
        let found = find_matches(&space, &cards, 3, usize::MAX);
        assert_eq!(found.len(), 12);
        for group in &found {
            assert!(cards_match(&space, group));
        }
    }

    #[test]
    fn test_find_matches_respects_limit() {
        let space = FeatureSpace::new(3, 2);
        let cards: Vec<Card> = space.all_cards().collect();
        assert_eq!(find_matches(&space, &cards, 3, 2).len(), 2);
    }

    #[test]
    fn test_has_match_without_any() {
        let space = FeatureSpace::new(3, 3);
        let cards = vec![
            space.card(&[0, 0, 0]).expect("card"),
            space.card(&[0, 0, 1]).expect("card"),
            space.card(&[1, 1, 1]).expect("card"),
        ];
        assert!(!has_match(&space, &cards, 3));
        assert!(!has_match(&space, &cards[..2], 3));
    }

    #[test]
    fn test_triple_shortcut_agrees_with_combination_search() {
        let space = FeatureSpace::new(3, 3);
        let all: Vec<Card> = space.all_cards().collect();
        for window in all.windows(5).step_by(2) {
            let exhaustive = !find_matches(&space, window, 3, 1).is_empty();
            assert_eq!(has_match(&space, window, 3), exhaustive, "{window:?}");
        }
    }

    #[test]
    fn test_cancelled_search_stops_early() {
        // C(60, 5) groups over a 4-value alphabet
        let space = FeatureSpace::new(4, 3);
        let cards: Vec<Card> = space.all_cards().take(60).collect();
        let started = std::time::Instant::now();
        assert!(find_matches_while(&space, &cards, 5, usize::MAX, || false).is_empty());
        assert_eq!(has_match_while(&space, &cards, 5, || false), None);
        assert_eq!(has_match_while(&FeatureSpace::new(3, 4), &cards, 3, || false), None);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_search_polls_while_running() {
        let space = FeatureSpace::new(4, 3);
        let cards: Vec<Card> = space.all_cards().take(40).collect();
        let mut polls = 0;
        // Five cards over four values never match, so the search runs to the
        // end unless stopped.
        let result = has_match_while(&space, &cards, 5, || {
            polls += 1;
            polls < 3
        });
        assert_eq!(result, None);
        assert_eq!(polls, 3);
    }
}
