//! # blind-deal
//!
//! A turn-based card table engine with per-player masked dealing.
//!
//! ## Design Principles
//!
//! 1. **Transport-agnostic**: The engine knows nothing about chats, buttons or
//!    callbacks. A transport drives `Game` through typed operations and renders
//!    the results.
//!
//! 2. **Explicit sessions**: There is no global game. `SessionRegistry` owns one
//!    game per table and serializes access to it.
//!
//! 3. **Refusals are values**: Joining a full table, playing out of turn or
//!    playing a card you don't hold returns a `GameError` and changes nothing.
//!
//! ## Masking
//!
//! At start the deck is masked under every player's key, shuffled, and dealt.
//! Each dealt or drawn card has all layers but its recipient's removed, so a
//! hand is only ever readable with its owner's key. The cipher is a toy shift
//! and provides no real secrecy; see `cipher`.
//!
//! ## Example
//!
//! ```
//! use blind_deal::core::{PlayerId, TableConfig};
//! use blind_deal::table::{Game, KeyOutcome, Phase};
//!
//! let (alice, bob) = (PlayerId::new(1), PlayerId::new(2));
//! let mut game = Game::new(TableConfig::new(2).with_seed(7)).unwrap();
//!
//! game.add_player(alice, "Alice").unwrap();
//! game.add_player(bob, "Bob").unwrap();
//! game.set_key(alice, 3).unwrap();
//! assert_eq!(game.set_key(bob, 7).unwrap(), KeyOutcome::Started);
//!
//! let token = game.playable_cards().unwrap()[0].clone();
//! game.play_card(alice, &token).unwrap();
//! assert_eq!(game.current_player(), Some(bob));
//! assert_eq!(game.phase(), Phase::InProgress);
//! ```
//!
//! ## Modules
//!
//! - `core`: Identifiers, RNG, configuration, errors
//! - `cards`: Cards and the deck
//! - `cipher`: Masking cipher and masked tokens
//! - `table`: Players and the game state machine
//! - `session`: Per-table session registry with turn deadlines

pub mod core;
pub mod cards;
pub mod cipher;
pub mod table;
pub mod session;

// Re-export commonly used types
pub use crate::core::{ConfigError, GameError, GameRng, PlayerId, TableConfig, TableId, TimeoutPolicy};

pub use crate::cards::{Card, CardParseError, Deck, Rank, Suit, DECK_SIZE};

pub use crate::cipher::{MaskKey, MaskedToken, MaskingCipher};

pub use crate::table::{
    Game, GameOutcome, KeyOutcome, Phase, PlayOutcome, Player,
    SeatView, TableEntry, TableView, TurnExpiry,
};

pub use crate::session::{SessionError, SessionRegistry};
