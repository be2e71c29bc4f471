//! Card values and the deck.
//!
//! ## Key Types
//!
//! - `Card`: rank + suit, parsed from and rendered to 2-3 character tokens
//! - `Deck`: ordered pile supporting shuffle and draw

pub mod card;
pub mod deck;

pub use card::{Card, CardParseError, Rank, Suit};
pub use deck::{Deck, DECK_SIZE};
