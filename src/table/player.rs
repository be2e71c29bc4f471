//! A seated player and their masked hand.

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::cipher::{MaskKey, MaskedToken};
use crate::core::{GameError, PlayerId};

/// A seated player.
///
/// The hand holds tokens masked under this player's own key only; the
/// game peels every other layer before a card reaches the hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    display_name: String,
    key: Option<MaskKey>,
    hand: Vec<MaskedToken>,
}

impl Player {
    /// Seat a player without a key and with an empty hand.
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            key: None,
            hand: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn key(&self) -> Option<MaskKey> {
        self.key
    }

    #[must_use]
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Choose the masking key. A key can be chosen exactly once.
    pub fn set_key(&mut self, key: MaskKey) -> Result<(), GameError> {
        if self.key.is_some() {
            return Err(GameError::KeyAlreadySet(self.id));
        }
        self.key = Some(key);
        Ok(())
    }

    /// Masked hand, in the order cards were received.
    #[must_use]
    pub fn hand(&self) -> &[MaskedToken] {
        &self.hand
    }

    #[must_use]
    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    pub fn add_card(&mut self, token: MaskedToken) {
        self.hand.push(token);
    }

    /// Remove the first hand entry whose masked text is `text`.
    ///
    /// Returns `None` if no entry matches.
    pub fn remove_card(&mut self, text: &str) -> Option<MaskedToken> {
        let pos = self.hand.iter().position(|token| token.text() == text)?;
        Some(self.hand.remove(pos))
    }

    /// Hand tokens unmasked with this player's key.
    ///
    /// Before a key is chosen the raw texts are returned (the hand is
    /// empty at that point in normal play).
    #[must_use]
    pub fn decrypted_hand(&self) -> Vec<String> {
        match self.key {
            Some(key) => self.hand.iter().map(|token| token.unmasked_text(key)).collect(),
            None => self.hand.iter().map(|token| token.text().to_string()).collect(),
        }
    }

    /// Decrypted hand parsed into cards.
    ///
    /// An entry that does not decrypt to a card was not masked under this
    /// player's key alone, which is an engine defect.
    pub fn hand_cards(&self) -> Result<Vec<Card>, GameError> {
        self.decrypted_hand()
            .iter()
            .map(|token| {
                Card::parse(token).map_err(|err| {
                    GameError::InvariantViolation(format!("unreadable card in {}'s hand: {err}", self.id))
                })
            })
            .collect()
    }

    /// Remove `card` from the hand, locating it through the decrypted view.
    pub fn take_card(&mut self, card: Card) -> Option<MaskedToken> {
        let wanted = card.token();
        let pos = self.decrypted_hand().iter().position(|token| *token == wanted)?;
        Some(self.hand.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    fn masked(card: Card, owner: PlayerId, key: MaskKey) -> MaskedToken {
        let mut token = MaskedToken::plain(card);
        token.mask(owner, key);
        token
    }

    #[test]
    fn test_new_player() {
        let player = Player::new(PlayerId::new(5), "alice");
        assert_eq!(player.id(), PlayerId::new(5));
        assert_eq!(player.display_name(), "alice");
        assert!(!player.has_key());
        assert_eq!(player.hand_size(), 0);
    }

    #[test]
    fn test_set_key_once() {
        let mut player = Player::new(PlayerId::new(5), "alice");
        let key = MaskKey::new(4).unwrap();

        assert_eq!(player.set_key(key), Ok(()));
        assert_eq!(player.key(), Some(key));
        assert_eq!(
            player.set_key(MaskKey::new(9).unwrap()),
            Err(GameError::KeyAlreadySet(PlayerId::new(5)))
        );
        assert_eq!(player.key(), Some(key));
    }

    #[test]
    fn test_decrypted_hand() {
        let id = PlayerId::new(1);
        let key = MaskKey::new(6).unwrap();
        let mut player = Player::new(id, "bob");
        player.set_key(key).unwrap();

        player.add_card(masked(Card::new(Rank::Ten, Suit::Spades), id, key));
        player.add_card(masked(Card::new(Rank::Two, Suit::Hearts), id, key));

        assert_eq!(player.decrypted_hand(), vec!["10S".to_string(), "2H".to_string()]);
        assert_eq!(
            player.hand_cards(),
            Ok(vec![Card::new(Rank::Ten, Suit::Spades), Card::new(Rank::Two, Suit::Hearts)])
        );
    }

    #[test]
    fn test_hand_cards_rejects_foreign_mask() {
        let id = PlayerId::new(1);
        let mut player = Player::new(id, "bob");
        player.set_key(MaskKey::new(3).unwrap()).unwrap();

        player.add_card(masked(Card::new(Rank::Four, Suit::Clubs), id, MaskKey::new(3).unwrap()));
        // Still carries another player's layer
        player.add_card(masked(Card::new(Rank::Ace, Suit::Spades), PlayerId::new(2), MaskKey::new(7).unwrap()));

        assert!(matches!(
            player.hand_cards(),
            Err(GameError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_remove_card_by_masked_text() {
        let id = PlayerId::new(1);
        let key = MaskKey::new(2).unwrap();
        let mut player = Player::new(id, "bob");
        player.set_key(key).unwrap();

        let token = masked(Card::new(Rank::King, Suit::Diamonds), id, key);
        player.add_card(token.clone());

        assert_eq!(player.remove_card("KD"), None);
        assert_eq!(player.remove_card(token.text()), Some(token));
        assert_eq!(player.hand_size(), 0);
    }

    #[test]
    fn test_take_card() {
        let id = PlayerId::new(1);
        let key = MaskKey::new(8).unwrap();
        let mut player = Player::new(id, "bob");
        player.set_key(key).unwrap();
        player.add_card(masked(Card::new(Rank::Ace, Suit::Clubs), id, key));

        assert!(player.take_card(Card::new(Rank::Ace, Suit::Hearts)).is_none());
        assert_eq!(player.hand_size(), 1);

        let taken = player.take_card(Card::new(Rank::Ace, Suit::Clubs)).unwrap();
        assert_eq!(taken.reveal(key).unwrap(), Card::new(Rank::Ace, Suit::Clubs));
        assert_eq!(player.hand_size(), 0);
    }
}
