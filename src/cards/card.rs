//! Playing card values and their text tokens.
//!
//! A card's wire token is its rank followed by a suit letter: `AS`, `10H`,
//! `7C`. Tokens are the only identity the transport sees (they double as
//! button callback data), so parse and render must stay bit-exact.
//!
//! ```
//! use blind_deal::cards::{Card, Rank, Suit};
//!
//! let card: Card = "10H".parse().unwrap();
//! assert_eq!(card, Card::new(Rank::Ten, Suit::Hearts));
//! assert_eq!(card.token(), "10H");
//! assert_eq!(card.render(), "10♥");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Card rank. Declaration order is the canonical deck order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Ace,
    King,
    Queen,
    Jack,
    Ten,
    Nine,
    Eight,
    Seven,
    Six,
    Five,
    Four,
    Three,
    Two,
}

impl Rank {
    /// All ranks in canonical order.
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::King,
        Rank::Queen,
        Rank::Jack,
        Rank::Ten,
        Rank::Nine,
        Rank::Eight,
        Rank::Seven,
        Rank::Six,
        Rank::Five,
        Rank::Four,
        Rank::Three,
        Rank::Two,
    ];

    /// Token text for this rank.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::King => "K",
            Rank::Queen => "Q",
            Rank::Jack => "J",
            Rank::Ten => "10",
            Rank::Nine => "9",
            Rank::Eight => "8",
            Rank::Seven => "7",
            Rank::Six => "6",
            Rank::Five => "5",
            Rank::Four => "4",
            Rank::Three => "3",
            Rank::Two => "2",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        Rank::ALL.into_iter().find(|rank| rank.symbol() == symbol)
    }
}

/// Card suit. Declaration order is the canonical deck order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    /// All suits in canonical order.
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    /// Token letter for this suit.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Suit::Spades => 'S',
            Suit::Hearts => 'H',
            Suit::Diamonds => 'D',
            Suit::Clubs => 'C',
        }
    }

    /// Display glyph for this suit.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
        }
    }

    fn from_letter(letter: u8) -> Option<Self> {
        Suit::ALL.into_iter().find(|suit| suit.letter() as u8 == letter)
    }
}

/// Failure to parse a card token.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CardParseError {
    /// Token is not 2 or 3 ASCII characters.
    #[error("invalid card token {token:?}")]
    InvalidFormat { token: String },

    #[error("unknown rank in card token {token:?}")]
    UnknownRank { token: String },

    #[error("unknown suit in card token {token:?}")]
    UnknownSuit { token: String },
}

/// An immutable playing card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    /// Create a card.
    #[must_use]
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Parse a wire token (`"QS"`, `"10D"`).
    pub fn parse(token: &str) -> Result<Self, CardParseError> {
        let bytes = token.as_bytes();
        if !token.is_ascii() || !(2..=3).contains(&bytes.len()) {
            return Err(CardParseError::InvalidFormat {
                token: token.to_string(),
            });
        }

        let (rank, suit) = token.split_at(bytes.len() - 1);
        let rank = Rank::from_symbol(rank).ok_or_else(|| CardParseError::UnknownRank {
            token: token.to_string(),
        })?;
        let suit = Suit::from_letter(suit.as_bytes()[0]).ok_or_else(|| CardParseError::UnknownSuit {
            token: token.to_string(),
        })?;

        Ok(Self { rank, suit })
    }

    /// Wire token: rank symbol followed by suit letter.
    #[must_use]
    pub fn token(&self) -> String {
        format!("{}{}", self.rank.symbol(), self.suit.letter())
    }

    /// Human-readable form: rank symbol followed by suit glyph.
    ///
    /// Display only; compare cards by value or token, never by this string.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}{}", self.rank.symbol(), self.suit.glyph())
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::str::FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Card::parse(s)
    }
}

impl TryFrom<String> for Card {
    type Error = CardParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Card::parse(&value)
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.token()
    }
}
