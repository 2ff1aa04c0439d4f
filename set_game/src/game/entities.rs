use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type alias for player identifiers (0-based, in creation order).
pub type PlayerId = usize;

/// Type alias for table positions.
pub type SlotIndex = usize;

/// A card is an opaque identifier from `[0, deck_size)`. Its features are
/// the digits of the identifier written in base `feature_size`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub u32);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{:<3}", self.0)
    }
}

/// Feature values of a single card, one entry per channel.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct Features(pub Vec<u8>);

impl Features {
    pub fn channels(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "({repr})")
    }
}

/// Shape of the card universe: `feature_count` channels, each taking one of
/// `feature_size` values.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FeatureSpace {
    pub feature_size: u8,
    pub feature_count: u8,
}

impl FeatureSpace {
    #[must_use]
    pub fn new(feature_size: u8, feature_count: u8) -> Self {
        Self {
            feature_size,
            feature_count,
        }
    }

    /// Number of distinct cards, saturating at `u64::MAX`.
    pub fn deck_size(&self) -> u64 {
        u64::from(self.feature_size).saturating_pow(u32::from(self.feature_count))
    }

    pub fn features(&self, card: Card) -> Features {
        let base = u32::from(self.feature_size.max(1));
        let mut id = card.0;
        let values = (0..self.feature_count)
            .map(|_| {
                let value = (id % base) as u8;
                id /= base;
                value
            })
            .collect();
        Features(values)
    }

    /// Inverse of [`FeatureSpace::features`]. Returns `None` when the slice
    /// has the wrong length or a value is out of range.
    pub fn card(&self, features: &[u8]) -> Option<Card> {
        if features.len() != usize::from(self.feature_count)
            || features.iter().any(|&v| v >= self.feature_size)
        {
            return None;
        }
        let base = u32::from(self.feature_size);
        let id = features
            .iter()
            .rev()
            .fold(0u32, |acc, &value| acc * base + u32::from(value));
        Some(Card(id))
    }

    pub fn all_cards(&self) -> impl Iterator<Item = Card> + use<> {
        let size = u32::try_from(self.deck_size()).unwrap_or(u32::MAX);
        (0..size).map(Card)
    }
}

/// Draw pool of undealt cards.
#[derive(Debug)]
pub struct Deck {
    // Drawn from the back.
    cards: Vec<Card>,
    rng: StdRng,
}

impl Deck {
    /// Creates a full, shuffled deck. A seed makes the shuffle order
    /// reproducible.
    pub fn new(space: &FeatureSpace, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut deck = Self {
            cards: space.all_cards().collect(),
            rng,
        };
        deck.shuffle();
        deck
    }

    /// Creates a deck that deals `cards` in the given order until the next
    /// shuffle.
    pub fn from_cards(mut cards: Vec<Card>) -> Self {
        cards.reverse();
        Self {
            cards,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut self.rng);
    }

    /// Puts cards taken off the table back into the pool. Callers shuffle
    /// afterwards.
    pub fn return_cards<I>(&mut self, cards: I)
    where
        I: IntoIterator<Item = Card>,
    {
        self.cards.extend(cards);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
