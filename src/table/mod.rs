//! A single card table: seated players and the game state machine.
//!
//! ## Key Types
//!
//! - `Player`: identity, key and masked hand
//! - `Game`: joining, key negotiation, dealing, turns and play
//! - `TableView`: public snapshot for status rendering

mod game;
mod player;
mod view;

pub use game::{Game, GameOutcome, KeyOutcome, Phase, PlayOutcome, TableEntry, TurnExpiry};
pub use player::Player;
pub use view::{SeatView, TableView};
