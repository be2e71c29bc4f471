//! Ordered draw pile.
//!
//! `Deck<T>` is generic over what it holds: a fresh deck holds `Card`s in
//! canonical order, a dealt table holds masked tokens. The top of the deck
//! is the end of the backing `Vec`, so `draw` is a pop.

use serde::{Deserialize, Serialize};

use super::card::{Card, Rank, Suit};
use crate::core::GameRng;

/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// An ordered pile of cards (or card tokens).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck<T = Card> {
    cards: Vec<T>,
}

impl Deck<Card> {
    /// All 52 cards: every rank of spades, then hearts, diamonds, clubs.
    #[must_use]
    pub fn standard() -> Self {
        let cards = Suit::ALL
            .into_iter()
            .flat_map(|suit| Rank::ALL.into_iter().map(move |rank| Card::new(rank, suit)))
            .collect();
        Self { cards }
    }
}

impl<T> Deck<T> {
    /// Build a deck from cards listed bottom to top.
    #[must_use]
    pub fn from_cards(cards: Vec<T>) -> Self {
        Self { cards }
    }

    /// Cards left.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Uniformly permute the deck in place.
    pub fn shuffle(&mut self, rng: &mut GameRng) {
        rng.shuffle(&mut self.cards);
    }

    /// Remove the top card. `None` means the deck is exhausted.
    pub fn draw(&mut self) -> Option<T> {
        self.cards.pop()
    }

    /// Transform every card, keeping order.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Deck<U> {
        Deck {
            cards: self.cards.into_iter().map(f).collect(),
        }
    }

    /// Iterate bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cards.iter()
    }

    /// Mutably iterate bottom to top.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.cards.iter_mut()
    }
}
