//! The table state machine.
//!
//! ```text
//! Forming --(N players seated)--> AwaitingKeys --(all keys chosen)--> InProgress --> Ended
//! ```
//!
//! Keys may be chosen as soon as a player is seated. Reaching `InProgress`
//! runs the start sequence: the deck is masked under every key in join
//! order, shuffled, and dealt round-robin. A card leaving the deck has every
//! layer except its recipient's peeled off, so hands are always masked under
//! their owner's key alone.
//!
//! The game does no locking of its own. Callers must serialize mutating
//! operations on one instance (see `session::SessionRegistry`).

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::player::Player;
use crate::cards::{Card, Deck, DECK_SIZE};
use crate::cipher::{MaskKey, MaskedToken};
use crate::core::{ConfigError, GameError, GameRng, PlayerId, TableConfig, TimeoutPolicy};

/// Lifecycle phase of a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Seats are open.
    Forming,
    /// All seats taken; waiting for keys.
    AwaitingKeys,
    /// Cards dealt; players take turns.
    InProgress,
    /// Terminal. Nothing mutates any more.
    Ended,
}

impl Phase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Forming => "forming",
            Phase::AwaitingKeys => "awaiting_keys",
            Phase::InProgress => "in_progress",
            Phase::Ended => "ended",
        }
    }
}

/// How a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Player emptied their hand.
    Winner(PlayerId),
    /// Player let their turn deadline pass under the forfeit policy.
    Forfeit(PlayerId),
    /// Torn down without a result.
    Abandoned,
}

impl GameOutcome {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, GameOutcome::Winner(p) if *p == player)
    }
}

/// One card on the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub player: PlayerId,
    pub player_name: String,
    pub card: Card,
}

impl TableEntry {
    /// Rendered card, e.g. `"Q♥"`.
    #[must_use]
    pub fn display(&self) -> String {
        self.card.render()
    }
}

/// Result of choosing a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Still waiting on seats or keys.
    Waiting,
    /// This was the last key; cards have been dealt.
    Started,
}

/// Result of a successful play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Turn passed to `next`.
    Continue { card: Card, next: PlayerId },
    /// The play emptied the hand and ended the game.
    Won { card: Card, winner: PlayerId },
}

/// Result of an expired turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnExpiry {
    Skipped { idle: PlayerId, next: PlayerId },
    Forfeited { idle: PlayerId },
}

/// One table's complete game state.
#[derive(Clone, Debug)]
pub struct Game {
    config: TableConfig,
    players: FxHashMap<PlayerId, Player>,
    join_order: Vec<PlayerId>,
    deck: Deck<MaskedToken>,
    table: Vector<TableEntry>,
    current: Option<PlayerId>,
    phase: Phase,
    outcome: Option<GameOutcome>,
    rng: GameRng,
}

impl Default for Game {
    fn default() -> Self {
        Self::from_validated(TableConfig::default())
    }
}

impl Game {
    /// Open an empty table, rejecting a configuration that could never start.
    pub fn new(config: TableConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Open an empty table with a configuration the caller already validated.
    pub(crate) fn from_validated(config: TableConfig) -> Self {
        let rng = config.seed.map_or_else(GameRng::from_entropy, GameRng::new);
        Self {
            config,
            players: FxHashMap::default(),
            join_order: Vec::new(),
            deck: Deck::standard().map(MaskedToken::plain),
            table: Vector::new(),
            current: None,
            phase: Phase::Forming,
            outcome: None,
            rng,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    #[must_use]
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Whose turn it is. `None` before the deal.
    #[must_use]
    pub fn current_player(&self) -> Option<PlayerId> {
        self.current
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Seated players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.join_order.iter().filter_map(|id| self.players.get(id))
    }

    #[must_use]
    pub fn join_order(&self) -> &[PlayerId] {
        &self.join_order
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.join_order.len()
    }

    #[must_use]
    pub fn deck(&self) -> &Deck<MaskedToken> {
        &self.deck
    }

    /// Cards played so far, oldest first.
    #[must_use]
    pub fn table(&self) -> &Vector<TableEntry> {
        &self.table
    }

    // === Forming / AwaitingKeys ===

    /// Seat a player.
    ///
    /// Rejected if the table is full, the id is already seated, or the game ended.
    pub fn add_player(&mut self, id: PlayerId, name: impl Into<String>) -> Result<(), GameError> {
        if self.is_ended() {
            return Err(GameError::GameEnded);
        }
        if self.players.contains_key(&id) {
            return Err(GameError::AlreadyJoined(id));
        }
        let capacity = self.config.player_count;
        if self.players.len() >= capacity || self.phase != Phase::Forming {
            return Err(GameError::TableFull { capacity });
        }

        let player = Player::new(id, name);
        debug!(player = %id, display_name = player.display_name(), "player joined");
        self.players.insert(id, player);
        self.join_order.push(id);

        if self.players.len() == capacity {
            self.phase = Phase::AwaitingKeys;
            info!(players = capacity, "table full, awaiting keys");
        }
        Ok(())
    }

    /// True when at least one player is seated and every seated player has a key.
    #[must_use]
    pub fn all_keys_set(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(Player::has_key)
    }

    /// Record a player's key.
    ///
    /// When this completes the set of keys at a full table, the start
    /// sequence runs before returning `KeyOutcome::Started`.
    pub fn set_key(&mut self, id: PlayerId, key: u8) -> Result<KeyOutcome, GameError> {
        match self.phase {
            Phase::Ended => return Err(GameError::GameEnded),
            Phase::InProgress => return Err(GameError::AlreadyStarted),
            Phase::Forming | Phase::AwaitingKeys => {}
        }

        let range = self.config.key_range();
        let out_of_range = GameError::KeyOutOfRange {
            key,
            min: *range.start(),
            max: *range.end(),
        };
        if !range.contains(&key) {
            return Err(out_of_range);
        }
        let key = MaskKey::new(key).ok_or(out_of_range)?;

        let player = self.players.get_mut(&id).ok_or(GameError::UnknownPlayer(id))?;
        player.set_key(key)?;
        debug!(player = %id, "key chosen");

        if self.phase == Phase::AwaitingKeys && self.all_keys_set() {
            self.start_game()?;
            return Ok(KeyOutcome::Started);
        }
        Ok(KeyOutcome::Waiting)
    }

    /// Mask, shuffle and deal.
    ///
    /// `set_key` calls this automatically; calling it directly is only
    /// needed when keys were set some other way. Runs at most once.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        match self.phase {
            Phase::Ended => return Err(GameError::GameEnded),
            Phase::InProgress => return Err(GameError::AlreadyStarted),
            Phase::Forming => {
                return Err(GameError::NotEnoughPlayers {
                    seated: self.players.len(),
                    needed: self.config.player_count,
                })
            }
            Phase::AwaitingKeys => {}
        }
        if !self.all_keys_set() {
            return Err(GameError::KeysPending);
        }

        let keys = self.layer_keys()?;
        for &(holder, key) in &keys {
            for token in self.deck.iter_mut() {
                token.mask(holder, key);
            }
        }
        self.deck.shuffle(&mut self.rng);

        for _ in 0..self.config.hand_size {
            for &(id, _) in &keys {
                self.deal_one(id, &keys)?;
            }
        }

        self.current = self.join_order.first().copied();
        self.phase = Phase::InProgress;
        info!(
            players = keys.len(),
            deck = self.deck.len(),
            seed = self.rng.seed(),
            "cards dealt, game started"
        );
        self.debug_check();
        Ok(())
    }

    // === InProgress ===

    /// Decrypted hand tokens of the player whose turn it is.
    pub fn playable_cards(&self) -> Result<Vec<String>, GameError> {
        self.ensure_in_progress()?;
        let current = self.current.ok_or(GameError::NotStarted)?;
        let player = self.players.get(&current).ok_or(GameError::UnknownPlayer(current))?;
        Ok(player.decrypted_hand())
    }

    /// A player's decrypted hand as cards, for private display.
    pub fn hand_of(&self, id: PlayerId) -> Result<Vec<Card>, GameError> {
        let player = self.players.get(&id).ok_or(GameError::UnknownPlayer(id))?;
        player.hand_cards()
    }

    /// Play the card named by `token` from `id`'s hand.
    ///
    /// A card the player does not hold is rejected without any state
    /// change. Emptying the hand wins the game; otherwise the turn passes.
    pub fn play_card(&mut self, id: PlayerId, token: &str) -> Result<PlayOutcome, GameError> {
        self.ensure_in_progress()?;
        let current = self.current.ok_or(GameError::NotStarted)?;
        if !self.players.contains_key(&id) {
            return Err(GameError::UnknownPlayer(id));
        }
        if id != current {
            return Err(GameError::NotYourTurn { player: id, current });
        }
        let card = Card::parse(token)?;

        let player = self.players.get_mut(&id).ok_or(GameError::UnknownPlayer(id))?;
        if player.take_card(card).is_none() {
            return Err(GameError::CardNotInHand { player: id, card });
        }
        let emptied = player.hand_size() == 0;
        self.table.push_back(TableEntry {
            player: id,
            player_name: player.display_name().to_string(),
            card,
        });
        debug!(player = %id, card = %card, "card played");

        let outcome = if emptied {
            self.end(GameOutcome::Winner(id));
            PlayOutcome::Won { card, winner: id }
        } else {
            let next = self.next_player()?;
            PlayOutcome::Continue { card, next }
        };
        self.debug_check();
        Ok(outcome)
    }

    /// Pass the turn to the next player in join order, wrapping around.
    pub fn next_player(&mut self) -> Result<PlayerId, GameError> {
        self.ensure_in_progress()?;
        let current = self.current.ok_or(GameError::NotStarted)?;
        let idx = self
            .join_order
            .iter()
            .position(|&id| id == current)
            .ok_or_else(|| GameError::InvariantViolation(format!("{current} missing from join order")))?;
        let next = self.join_order[(idx + 1) % self.join_order.len()];
        self.current = Some(next);
        debug!(from = %current, to = %next, "turn advanced");
        Ok(next)
    }

    /// Draw the top card into `id`'s hand.
    ///
    /// `Ok(None)` means the deck is empty and nothing changed. The drawn
    /// card goes through the same peeling as a dealt card, so it lands
    /// masked under the drawer's key.
    pub fn draw_card(&mut self, id: PlayerId) -> Result<Option<Card>, GameError> {
        self.ensure_in_progress()?;
        if !self.players.contains_key(&id) {
            return Err(GameError::UnknownPlayer(id));
        }
        if self.deck.is_empty() {
            debug!(player = %id, "draw from empty deck");
            return Ok(None);
        }

        let keys = self.layer_keys()?;
        let card = self.deal_one(id, &keys)?;
        debug!(player = %id, deck = self.deck.len(), "card drawn");
        self.debug_check();
        Ok(card)
    }

    /// Apply a turn timeout to the current player.
    pub fn expire_turn(&mut self, policy: TimeoutPolicy) -> Result<TurnExpiry, GameError> {
        self.ensure_in_progress()?;
        let idle = self.current.ok_or(GameError::NotStarted)?;
        match policy {
            TimeoutPolicy::Skip => {
                let next = self.next_player()?;
                info!(player = %idle, next = %next, "turn timed out, skipped");
                Ok(TurnExpiry::Skipped { idle, next })
            }
            TimeoutPolicy::Forfeit => {
                self.end(GameOutcome::Forfeit(idle));
                Ok(TurnExpiry::Forfeited { idle })
            }
        }
    }

    // === Ended ===

    /// End the game without a result.
    pub fn abandon(&mut self) -> Result<(), GameError> {
        if self.is_ended() {
            return Err(GameError::GameEnded);
        }
        self.end(GameOutcome::Abandoned);
        Ok(())
    }

    // === Invariants ===

    /// Cards in the deck, all hands and on the table.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.deck.len() + self.players.values().map(Player::hand_size).sum::<usize>() + self.table.len()
    }

    /// Verify that no card was created or lost.
    pub fn check_conservation(&self) -> Result<(), GameError> {
        let count = self.card_count();
        if count != DECK_SIZE {
            return Err(GameError::InvariantViolation(format!(
                "{count} cards in play, expected {DECK_SIZE}"
            )));
        }
        Ok(())
    }

    // === Internals ===

    fn ensure_in_progress(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::InProgress => Ok(()),
            Phase::Ended => Err(GameError::GameEnded),
            Phase::Forming | Phase::AwaitingKeys => Err(GameError::NotStarted),
        }
    }

    fn end(&mut self, outcome: GameOutcome) {
        self.phase = Phase::Ended;
        self.outcome = Some(outcome);
        info!(?outcome, played = self.table.len(), "game ended");
    }

    /// Every seated player's key, in join order.
    fn layer_keys(&self) -> Result<Vec<(PlayerId, MaskKey)>, GameError> {
        self.join_order
            .iter()
            .map(|&id| {
                let key = self.players.get(&id).and_then(Player::key).ok_or(GameError::KeysPending)?;
                Ok((id, key))
            })
            .collect()
    }

    /// Move the top deck card to `to`, peeling every other player's layer.
    fn deal_one(&mut self, to: PlayerId, keys: &[(PlayerId, MaskKey)]) -> Result<Option<Card>, GameError> {
        let Some(mut token) = self.deck.draw() else {
            return Ok(None);
        };

        let mut owner_key = None;
        for &(holder, key) in keys {
            if holder == to {
                owner_key = Some(key);
            } else if !token.peel(holder, key) {
                return Err(GameError::InvariantViolation(format!(
                    "deck card carries no layer from {holder}"
                )));
            }
        }
        let owner_key = match owner_key {
            Some(key) if token.is_held_only_by(to) => key,
            _ => {
                return Err(GameError::InvariantViolation(format!(
                    "dealt card is not masked for {to}"
                )))
            }
        };
        let card = token
            .reveal(owner_key)
            .map_err(|err| GameError::InvariantViolation(err.to_string()))?;

        let player = self.players.get_mut(&to).ok_or(GameError::UnknownPlayer(to))?;
        player.add_card(token);
        Ok(Some(card))
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.card_count(), DECK_SIZE, "card conservation violated");
    }
}
