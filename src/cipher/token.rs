//! Masked card tokens with layer bookkeeping.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::masking::{MaskKey, MaskingCipher};
use crate::cards::{Card, CardParseError};
use crate::core::PlayerId;

/// A card token under zero or more masking layers.
///
/// `holders` lists, in application order, the players whose key is
/// currently applied. The list is public table knowledge; the keys are not.
///
/// ```
/// use blind_deal::cards::Card;
/// use blind_deal::cipher::{MaskKey, MaskedToken};
/// use blind_deal::core::PlayerId;
///
/// let (alice, bob) = (PlayerId::new(1), PlayerId::new(2));
/// let (ka, kb) = (MaskKey::new(3).unwrap(), MaskKey::new(7).unwrap());
///
/// let mut token = MaskedToken::plain(Card::parse("JS").unwrap());
/// token.mask(alice, ka);
/// token.mask(bob, kb);
///
/// // Bob hands the card to Alice by removing his own layer
/// assert!(token.peel(bob, kb));
/// assert!(token.is_held_only_by(alice));
/// assert_eq!(token.reveal(ka).unwrap(), Card::parse("JS").unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaskedToken {
    text: String,
    holders: SmallVec<[PlayerId; 8]>,
}

impl MaskedToken {
    /// An unmasked token for `card`.
    #[must_use]
    pub fn plain(card: Card) -> Self {
        Self {
            text: card.token(),
            holders: SmallVec::new(),
        }
    }

    /// Current (possibly masked) text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Players whose layer is applied, in application order.
    #[must_use]
    pub fn holders(&self) -> &[PlayerId] {
        &self.holders
    }

    /// True when exactly one layer remains and it belongs to `player`.
    #[must_use]
    pub fn is_held_only_by(&self, player: PlayerId) -> bool {
        self.holders.as_slice() == [player]
    }

    /// Apply `holder`'s layer.
    pub fn mask(&mut self, holder: PlayerId, key: MaskKey) {
        self.text = MaskingCipher::mask(&self.text, key);
        self.holders.push(holder);
    }

    /// Remove `holder`'s layer. Returns `false` (and leaves the token
    /// untouched) if `holder` has no layer on this token.
    pub fn peel(&mut self, holder: PlayerId, key: MaskKey) -> bool {
        let Some(pos) = self.holders.iter().position(|&h| h == holder) else {
            return false;
        };
        self.text = MaskingCipher::unmask(&self.text, key);
        self.holders.remove(pos);
        true
    }

    /// Unmask with `key` without consuming the token.
    #[must_use]
    pub fn unmasked_text(&self, key: MaskKey) -> String {
        MaskingCipher::unmask(&self.text, key)
    }

    /// Unmask with `key` and parse the result as a card.
    ///
    /// Only meaningful when `key` belongs to the single remaining holder;
    /// any other key yields garbage that fails to parse or parses to the
    /// wrong card.
    pub fn reveal(&self, key: MaskKey) -> Result<Card, CardParseError> {
        Card::parse(&self.unmasked_text(key))
    }
}
