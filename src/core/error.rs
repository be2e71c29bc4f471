//! Error types for table operations and configuration.
//!
//! Every variant of `GameError` is a recoverable outcome: the operation
//! was refused and the game is exactly as it was before the call.
//! `InvariantViolation` is the one exception and indicates an engine defect.

use thiserror::Error;

use super::player::PlayerId;
use crate::cards::{Card, CardParseError};

/// A refused table operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("table is full ({capacity} players)")]
    TableFull { capacity: usize },

    #[error("{0} already joined")]
    AlreadyJoined(PlayerId),

    #[error("{0} is not seated at this table")]
    UnknownPlayer(PlayerId),

    #[error("key {key} outside allowed range {min}..={max}")]
    KeyOutOfRange { key: u8, min: u8, max: u8 },

    #[error("{0} already chose a key")]
    KeyAlreadySet(PlayerId),

    #[error("game already started")]
    AlreadyStarted,

    #[error("game has not started")]
    NotStarted,

    #[error("{seated} of {needed} players seated")]
    NotEnoughPlayers { seated: usize, needed: usize },

    #[error("not every player has chosen a key")]
    KeysPending,

    #[error("not {player}'s turn (current: {current})")]
    NotYourTurn { player: PlayerId, current: PlayerId },

    #[error("{player} does not hold {card}")]
    CardNotInHand { player: PlayerId, card: Card },

    #[error("game has ended")]
    GameEnded,

    #[error(transparent)]
    InvalidCard(#[from] CardParseError),

    #[error("engine invariant violated: {0}")]
    InvariantViolation(String),
}

impl GameError {
    /// True for the outcomes a transport reports as a plain "rejected".
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GameError::InvariantViolation(_))
    }
}

/// Invalid table configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("player count {0} outside 2..=8")]
    PlayerCount(usize),

    #[error("hand size {hand_size} cannot be dealt to {players} players from 52 cards")]
    HandSize { hand_size: usize, players: usize },

    #[error("key range {min}..={max} must be non-empty and below 128")]
    KeyRange { min: u8, max: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GameError::NotYourTurn {
            player: PlayerId::new(2),
            current: PlayerId::new(1),
        };
        assert_eq!(err.to_string(), "not Player(2)'s turn (current: Player(1))");

        let err = GameError::TableFull { capacity: 2 };
        assert_eq!(err.to_string(), "table is full (2 players)");
    }

    #[test]
    fn test_parse_error_converts() {
        let err: GameError = CardParseError::InvalidFormat { token: "A".into() }.into();
        assert!(matches!(err, GameError::InvalidCard(_)));
        assert!(err.is_rejection());
        assert!(!GameError::InvariantViolation("x".into()).is_rejection());
    }
}
