//! Session registry keyed by table id, with turn deadlines.

use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};
use std::time::Instant;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{ConfigError, GameError, PlayerId, TableConfig, TableId};
use crate::table::{Game, Phase, TurnExpiry};

/// A refused registry operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no session open for {0}")]
    NoSession(TableId),

    #[error("{0} already has a game in progress")]
    SessionActive(TableId),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// One table's game plus its turn clock.
#[derive(Debug)]
struct Session {
    game: Game,
    turn_holder: Option<PlayerId>,
    turn_deadline: Option<Instant>,
}

impl Session {
    fn new(game: Game) -> Self {
        Self {
            game,
            turn_holder: None,
            turn_deadline: None,
        }
    }

    /// Restart the clock whenever the turn changes hands.
    fn refresh_deadline(&mut self, now: Instant) {
        if self.game.phase() != Phase::InProgress {
            self.turn_holder = None;
            self.turn_deadline = None;
            return;
        }
        let current = self.game.current_player();
        if current != self.turn_holder {
            self.turn_holder = current;
            self.turn_deadline = self.game.config().turn_timeout.map(|timeout| now + timeout);
        }
    }

    fn is_overdue(&self, now: Instant) -> bool {
        self.turn_deadline.is_some_and(|deadline| deadline <= now)
    }
}

/// All live tables of one transport.
#[derive(Debug)]
pub struct SessionRegistry {
    config: TableConfig,
    sessions: RwLock<FxHashMap<TableId, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    /// Create a registry whose tables all use `config`.
    pub fn new(config: TableConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: RwLock::new(FxHashMap::default()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Number of open sessions, ended ones included until reaped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, table: TableId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&table)
    }

    /// Open a fresh game at `table`.
    ///
    /// An ended game at the same table is replaced; a live or busy one is not.
    pub fn open(&self, table: TableId) -> Result<(), SessionError> {
        let seen = self.session(table).ok();
        if let Some(existing) = &seen {
            if !peek(existing, |session| session.game.is_ended()).unwrap_or(false) {
                return Err(SessionError::SessionActive(table));
            }
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = sessions.get(&table) {
            // Another caller opened this table since we looked
            if !seen.as_ref().is_some_and(|seen| Arc::ptr_eq(current, seen)) {
                return Err(SessionError::SessionActive(table));
            }
        }
        sessions.insert(
            table,
            Arc::new(Mutex::new(Session::new(Game::from_validated(self.config.clone())))),
        );
        info!(%table, "session opened");
        Ok(())
    }

    /// Drop the session at `table`. Returns `false` if none was open.
    pub fn close(&self, table: TableId) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&table)
            .is_some();
        if removed {
            info!(%table, "session closed");
        }
        removed
    }

    /// Run `f` with exclusive access to the game at `table`.
    ///
    /// `f` may call back into the registry for other tables. Calling
    /// `with_game` on the same table from inside `f` deadlocks.
    pub fn with_game<R>(&self, table: TableId, f: impl FnOnce(&mut Game) -> R) -> Result<R, SessionError> {
        self.with_game_at(table, Instant::now(), f)
    }

    /// `with_game` with an explicit clock reading for the turn deadline.
    pub fn with_game_at<R>(
        &self,
        table: TableId,
        now: Instant,
        f: impl FnOnce(&mut Game) -> R,
    ) -> Result<R, SessionError> {
        let session = self.session(table)?;
        let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut session.game);
        session.refresh_deadline(now);
        Ok(result)
    }

    /// Run a fallible game operation, flattening its error into `SessionError`.
    pub fn apply<R>(
        &self,
        table: TableId,
        f: impl FnOnce(&mut Game) -> Result<R, GameError>,
    ) -> Result<R, SessionError> {
        match self.with_game(table, f)? {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(%table, error = %err, "operation rejected");
                Err(err.into())
            }
        }
    }

    /// Current turn deadline at `table`.
    pub fn turn_deadline(&self, table: TableId) -> Result<Option<Instant>, SessionError> {
        let session = self.session(table)?;
        let session = session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(session.turn_deadline)
    }

    /// Apply the timeout policy to every table whose turn deadline has passed.
    ///
    /// Tables busy in another call are left for the next sweep.
    pub fn expire_turns(&self, now: Instant) -> Vec<(TableId, TurnExpiry)> {
        let policy = self.config.timeout_policy;
        let mut expired = Vec::new();

        for (table, session) in self.snapshot() {
            let expiry = peek(&session, |session| {
                if !session.is_overdue(now) {
                    return None;
                }
                let result = session.game.expire_turn(policy);
                session.refresh_deadline(now);
                Some(result)
            });
            match expiry.flatten() {
                Some(Ok(expiry)) => {
                    warn!(%table, ?expiry, "turn deadline passed");
                    expired.push((table, expiry));
                }
                Some(Err(err)) => debug!(%table, error = %err, "stale deadline"),
                None => {}
            }
        }

        expired
    }

    /// Remove every session whose game has ended. Returns how many were removed.
    ///
    /// Tables busy in another call are kept until the next sweep.
    pub fn reap_ended(&self) -> usize {
        let ended: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|(_, session)| peek(session, |session| session.game.is_ended()).unwrap_or(false))
            .collect();
        if ended.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let mut reaped = 0;
        for (table, session) in ended {
            if sessions.get(&table).is_some_and(|current| Arc::ptr_eq(current, &session)) {
                sessions.remove(&table);
                reaped += 1;
            }
        }
        if reaped > 0 {
            debug!(reaped, "ended sessions removed");
        }
        reaped
    }

    fn session(&self, table: TableId) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&table)
            .cloned()
            .ok_or(SessionError::NoSession(table))
    }

    fn snapshot(&self) -> Vec<(TableId, Arc<Mutex<Session>>)> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(table, session)| (*table, Arc::clone(session)))
            .collect()
    }
}

/// Run `f` on a session unless another caller holds it.
///
/// Never blocks, so sweeps and `open` cannot deadlock against a `with_game`
/// closure that re-enters the registry.
fn peek<R>(session: &Mutex<Session>, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
    match session.try_lock() {
        Ok(mut guard) => Some(f(&mut guard)),
        Err(TryLockError::Poisoned(poisoned)) => Some(f(&mut poisoned.into_inner())),
        Err(TryLockError::WouldBlock) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimeoutPolicy;
    use std::time::Duration;

    const TABLE: TableId = TableId::new(-100);
    const ALICE: PlayerId = PlayerId::new(1);
    const BOB: PlayerId = PlayerId::new(2);

    fn registry(config: TableConfig) -> SessionRegistry {
        SessionRegistry::new(config.with_seed(9)).unwrap()
    }

    fn start(registry: &SessionRegistry, now: Instant) {
        registry
            .with_game_at(TABLE, now, |game| {
                game.add_player(ALICE, "Alice")?;
                game.add_player(BOB, "Bob")?;
                game.set_key(ALICE, 3)?;
                game.set_key(BOB, 7)
            })
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert_eq!(
            SessionRegistry::new(TableConfig::new(1)).unwrap_err(),
            ConfigError::PlayerCount(1)
        );
    }

    #[test]
    fn test_open_and_close() {
        let registry = registry(TableConfig::default());
        assert!(registry.is_empty());

        registry.open(TABLE).unwrap();
        assert!(registry.contains(TABLE));
        assert_eq!(registry.open(TABLE), Err(SessionError::SessionActive(TABLE)));

        assert!(registry.close(TABLE));
        assert!(!registry.close(TABLE));
        assert_eq!(
            registry.with_game(TABLE, |game| game.phase()),
            Err(SessionError::NoSession(TABLE))
        );
    }

    #[test]
    fn test_open_replaces_ended_game() {
        let registry = registry(TableConfig::default());
        registry.open(TABLE).unwrap();
        registry.apply(TABLE, |game| game.abandon()).unwrap();

        registry.open(TABLE).unwrap();
        assert_eq!(registry.with_game(TABLE, |game| game.phase()), Ok(Phase::Forming));
    }

    #[test]
    fn test_apply_flattens_errors() {
        let registry = registry(TableConfig::default());
        registry.open(TABLE).unwrap();

        assert_eq!(
            registry.apply(TABLE, |game| game.draw_card(ALICE)),
            Err(SessionError::Game(GameError::NotStarted))
        );
    }

    #[test]
    fn test_no_deadline_without_timeout() {
        let registry = registry(TableConfig::default());
        registry.open(TABLE).unwrap();
        start(&registry, Instant::now());

        assert_eq!(registry.turn_deadline(TABLE), Ok(None));
        assert!(registry.expire_turns(Instant::now() + Duration::from_secs(3600)).is_empty());
    }

    #[test]
    fn test_deadline_starts_with_first_turn() {
        let timeout = Duration::from_secs(30);
        let registry = registry(TableConfig::default().with_turn_timeout(timeout, TimeoutPolicy::Skip));
        registry.open(TABLE).unwrap();

        let t0 = Instant::now();
        assert_eq!(registry.with_game_at(TABLE, t0, |game| game.phase()), Ok(Phase::Forming));
        assert_eq!(registry.turn_deadline(TABLE), Ok(None));

        start(&registry, t0);
        assert_eq!(registry.turn_deadline(TABLE), Ok(Some(t0 + timeout)));
    }

    #[test]
    fn test_expire_skip() {
        let timeout = Duration::from_secs(30);
        let registry = registry(TableConfig::default().with_turn_timeout(timeout, TimeoutPolicy::Skip));
        registry.open(TABLE).unwrap();
        let t0 = Instant::now();
        start(&registry, t0);

        assert!(registry.expire_turns(t0 + Duration::from_secs(10)).is_empty());

        let t1 = t0 + timeout;
        let expired = registry.expire_turns(t1);
        assert_eq!(expired, vec![(TABLE, TurnExpiry::Skipped { idle: ALICE, next: BOB })]);
        assert_eq!(registry.turn_deadline(TABLE), Ok(Some(t1 + timeout)));
        assert_eq!(registry.with_game(TABLE, |game| game.current_player()), Ok(Some(BOB)));
    }

    #[test]
    fn test_expire_forfeit_and_reap() {
        let timeout = Duration::from_secs(5);
        let registry = registry(TableConfig::default().with_turn_timeout(timeout, TimeoutPolicy::Forfeit));
        registry.open(TABLE).unwrap();
        registry.open(TableId::new(-200)).unwrap();
        let t0 = Instant::now();
        start(&registry, t0);

        let expired = registry.expire_turns(t0 + timeout);
        assert_eq!(expired, vec![(TABLE, TurnExpiry::Forfeited { idle: ALICE })]);
        assert_eq!(registry.turn_deadline(TABLE), Ok(None));

        assert_eq!(registry.reap_ended(), 1);
        assert!(!registry.contains(TABLE));
        assert!(registry.contains(TableId::new(-200)));
    }

    #[test]
    fn test_closure_may_reenter_registry() {
        let timeout = Duration::from_secs(1);
        let registry = registry(TableConfig::default().with_turn_timeout(timeout, TimeoutPolicy::Skip));
        let other = TableId::new(-300);
        registry.open(TABLE).unwrap();
        registry.open(other).unwrap();
        registry.apply(other, |game| game.abandon()).unwrap();

        let (reopened, own_table, reaped, expired) = registry
            .with_game(TABLE, |_| {
                (
                    registry.open(other),
                    registry.open(TABLE),
                    registry.reap_ended(),
                    registry.expire_turns(Instant::now() + timeout),
                )
            })
            .unwrap();

        assert_eq!(reopened, Ok(()));
        assert_eq!(own_table, Err(SessionError::SessionActive(TABLE)));
        assert_eq!(reaped, 0);
        assert!(expired.is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_busy_ended_session_is_reaped_later() {
        let registry = registry(TableConfig::default());
        registry.open(TABLE).unwrap();

        let reaped_while_busy = registry
            .with_game(TABLE, |game| {
                game.abandon().unwrap();
                registry.reap_ended()
            })
            .unwrap();

        assert_eq!(reaped_while_busy, 0);
        assert_eq!(registry.reap_ended(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_play_resets_deadline() {
        let timeout = Duration::from_secs(30);
        let registry = registry(TableConfig::default().with_turn_timeout(timeout, TimeoutPolicy::Skip));
        registry.open(TABLE).unwrap();
        let t0 = Instant::now();
        start(&registry, t0);

        let t1 = t0 + Duration::from_secs(12);
        registry
            .with_game_at(TABLE, t1, |game| {
                let token = game.playable_cards()?[0].clone();
                game.play_card(ALICE, &token)
            })
            .unwrap()
            .unwrap();

        assert_eq!(registry.turn_deadline(TABLE), Ok(Some(t1 + timeout)));
    }
}
