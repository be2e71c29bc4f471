//! Core engine types: identifiers, RNG, configuration, errors.
//!
//! Everything here is independent of card semantics. The table state
//! machine in `table` and the registry in `session` build on these.

pub mod config;
pub mod error;
pub mod player;
pub mod rng;

pub use config::{TableConfig, TimeoutPolicy};
pub use error::{ConfigError, GameError};
pub use player::{PlayerId, TableId};
pub use rng::GameRng;
