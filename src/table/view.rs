//! Read-only snapshot of a table for status rendering.
//!
//! The transport turns a `TableView` into its status message. Nothing in
//! the view reveals hand contents; private hands go through `Game::hand_of`.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::game::{Game, GameOutcome, Phase, TableEntry};
use crate::core::PlayerId;

/// Public information about one seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub cards: usize,
    pub has_key: bool,
    pub is_current: bool,
}

/// Public snapshot of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub phase: Phase,
    pub current_player: Option<PlayerId>,
    pub current_player_name: Option<String>,
    /// Seats in join order.
    pub seats: Vec<SeatView>,
    pub table: Vector<TableEntry>,
    pub deck_remaining: usize,
    pub seats_open: usize,
    pub outcome: Option<GameOutcome>,
}

impl Game {
    /// Snapshot the public table state.
    #[must_use]
    pub fn view(&self) -> TableView {
        let current = self.current_player();
        let seats: Vec<SeatView> = self
            .players()
            .map(|player| SeatView {
                id: player.id(),
                name: player.display_name().to_string(),
                cards: player.hand_size(),
                has_key: player.has_key(),
                is_current: Some(player.id()) == current,
            })
            .collect();

        TableView {
            phase: self.phase(),
            current_player: current,
            current_player_name: current
                .and_then(|id| self.player(id))
                .map(|player| player.display_name().to_string()),
            seats_open: self.config().player_count.saturating_sub(seats.len()),
            seats,
            table: self.table().clone(),
            deck_remaining: self.deck().len(),
            outcome: self.outcome(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TableConfig;

    #[test]
    fn test_view_while_forming() {
        let mut game = Game::new(TableConfig::new(3).with_seed(5)).unwrap();
        game.add_player(PlayerId::new(1), "Alice").unwrap();

        let view = game.view();
        assert_eq!(view.phase, Phase::Forming);
        assert_eq!(view.seats_open, 2);
        assert_eq!(view.current_player_name, None);
        assert_eq!(view.seats.len(), 1);
        assert!(!view.seats[0].has_key);
        assert_eq!(view.deck_remaining, 52);
    }

    #[test]
    fn test_view_in_progress() {
        let (alice, bob) = (PlayerId::new(1), PlayerId::new(2));
        let mut game = Game::new(TableConfig::new(2).with_seed(5)).unwrap();
        game.add_player(alice, "Alice").unwrap();
        game.add_player(bob, "Bob").unwrap();
        game.set_key(alice, 1).unwrap();
        game.set_key(bob, 2).unwrap();

        let token = game.playable_cards().unwrap()[0].clone();
        game.play_card(alice, &token).unwrap();

        let view = game.view();
        assert_eq!(view.phase, Phase::InProgress);
        assert_eq!(view.current_player, Some(bob));
        assert_eq!(view.current_player_name.as_deref(), Some("Bob"));
        assert_eq!(view.seats[0].cards, 4);
        assert_eq!(view.seats[1].cards, 5);
        assert!(view.seats[1].is_current);
        assert!(!view.seats[0].is_current);
        assert_eq!(view.table.len(), 1);
        assert_eq!(view.deck_remaining, 42);
    }

    #[test]
    fn test_view_serializes() {
        let game = Game::new(TableConfig::new(2).with_seed(5)).unwrap();
        let json = serde_json::to_value(game.view()).unwrap();
        assert_eq!(json["phase"], "Forming");
        assert_eq!(json["seats_open"], 2);
        assert!(json["table"].as_array().unwrap().is_empty());
    }
}
