//! Table configuration.
//!
//! The transport builds one `TableConfig` at startup (usually from the
//! environment) and hands a clone to every new game.
//!
//! ```
//! use blind_deal::core::{TableConfig, TimeoutPolicy};
//! use std::time::Duration;
//!
//! let config = TableConfig::new(3)
//!     .with_hand_size(7)
//!     .with_turn_timeout(Duration::from_secs(60), TimeoutPolicy::Skip)
//!     .with_seed(42);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.player_count, 3);
//! ```

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::cards::DECK_SIZE;

/// Environment variable holding the number of seats.
pub const ENV_NUM_PLAYERS: &str = "NUM_PLAYERS";
/// Environment variable holding the dealt hand size.
pub const ENV_HAND_SIZE: &str = "HAND_SIZE";
/// Environment variable holding the per-turn deadline in seconds.
pub const ENV_TURN_TIMEOUT_SECS: &str = "TURN_TIMEOUT_SECS";

/// What happens to a player who lets their turn deadline pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutPolicy {
    /// The turn passes to the next player.
    #[default]
    Skip,
    /// The game ends and the idle player forfeits.
    Forfeit,
}

/// Configuration shared by every table a transport opens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Seats per table (N). The game starts only with exactly N players.
    pub player_count: usize,

    /// Cards dealt to each player at start.
    pub hand_size: usize,

    /// Smallest key a player may choose.
    pub min_key: u8,

    /// Largest key a player may choose.
    pub max_key: u8,

    /// Per-turn deadline. `None` disables turn expiry.
    pub turn_timeout: Option<Duration>,

    /// Applied when `turn_timeout` elapses.
    pub timeout_policy: TimeoutPolicy,

    /// Fixed shuffle seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            player_count: 2,
            hand_size: 5,
            min_key: 1,
            max_key: 10,
            turn_timeout: None,
            timeout_policy: TimeoutPolicy::Skip,
            seed: None,
        }
    }
}

impl TableConfig {
    /// Create a configuration for `player_count` seats with default rules.
    pub fn new(player_count: usize) -> Self {
        Self {
            player_count,
            ..Self::default()
        }
    }

    /// Set the dealt hand size.
    #[must_use]
    pub fn with_hand_size(mut self, hand_size: usize) -> Self {
        self.hand_size = hand_size;
        self
    }

    /// Set the allowed key range.
    #[must_use]
    pub fn with_key_range(mut self, range: RangeInclusive<u8>) -> Self {
        self.min_key = *range.start();
        self.max_key = *range.end();
        self
    }

    /// Enable a per-turn deadline.
    #[must_use]
    pub fn with_turn_timeout(mut self, timeout: Duration, policy: TimeoutPolicy) -> Self {
        self.turn_timeout = Some(timeout);
        self.timeout_policy = policy;
        self
    }

    /// Use a fixed shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Allowed key range.
    #[must_use]
    pub fn key_range(&self) -> RangeInclusive<u8> {
        self.min_key..=self.max_key
    }

    /// Check the configuration can actually be played.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=8).contains(&self.player_count) {
            return Err(ConfigError::PlayerCount(self.player_count));
        }
        let dealt = self.hand_size.checked_mul(self.player_count);
        if self.hand_size == 0 || dealt.map_or(true, |n| n > DECK_SIZE) {
            return Err(ConfigError::HandSize {
                hand_size: self.hand_size,
                players: self.player_count,
            });
        }
        if self.min_key > self.max_key || self.max_key >= 128 {
            return Err(ConfigError::KeyRange {
                min: self.min_key,
                max: self.max_key,
            });
        }
        Ok(())
    }

    /// Build a configuration from process environment variables.
    ///
    /// Reads `NUM_PLAYERS`, `HAND_SIZE` and `TURN_TIMEOUT_SECS`; unset
    /// variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_NUM_PLAYERS) {
            config.player_count = parse_var(ENV_NUM_PLAYERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HAND_SIZE) {
            config.hand_size = parse_var(ENV_HAND_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TURN_TIMEOUT_SECS) {
            let secs: u64 = parse_var(ENV_TURN_TIMEOUT_SECS, &raw)?;
            config.turn_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}
