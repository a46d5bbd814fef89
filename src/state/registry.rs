//! In-memory registry of live and finished sessions, plus the table of armed
//! answer-reveal timers.

use dashmap::DashMap;
use rand::Rng;
use tokio::task::JoinHandle;

use crate::dao::models::GameId;
use crate::state::session::{PlayerId, Session, SessionId};

/// Identifiers are drawn uniformly from this range and retried on collision,
/// so join codes are always 6–8 digits.
const ID_RANGE: std::ops::Range<u64> = 100_000..100_000_000;

/// Owner of all session state. Injectable (not a module global) so tests can
/// run independent instances side by side.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
    reveal_timers: DashMap<SessionId, JoinHandle<()>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a session id not currently tracked by the registry.
    pub fn generate_session_id(&self) -> SessionId {
        let mut rng = rand::rng();
        loop {
            let id = rng.random_range(ID_RANGE);
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }

    /// Draw a player id not used by any player in any session.
    pub fn generate_player_id(&self) -> PlayerId {
        let mut rng = rand::rng();
        loop {
            let id = rng.random_range(ID_RANGE);
            let taken = self
                .sessions
                .iter()
                .any(|entry| entry.players.contains_key(&id));
            if !taken {
                return id;
            }
        }
    }

    /// Track a freshly started session.
    pub fn insert(&self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    /// Id of the unique active session for the game. Zero or (invariant
    /// violation) several matches both yield `None` rather than a panic.
    pub fn active_session_for_game(&self, game_id: GameId) -> Option<SessionId> {
        let mut found = None;
        for entry in self.sessions.iter() {
            if entry.game_id == game_id && entry.active {
                if found.is_some() {
                    return None;
                }
                found = Some(entry.id);
            }
        }
        found
    }

    /// Ids of every ended session for the game, for history display.
    pub fn inactive_sessions_for_game(&self, game_id: GameId) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.game_id == game_id && !entry.active)
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Linear scan for the session containing the player.
    pub fn session_for_player(&self, player_id: PlayerId) -> Option<SessionId> {
        self.sessions
            .iter()
            .find(|entry| entry.players.contains_key(&player_id))
            .map(|entry| entry.id)
    }

    /// Run a closure against a session, if present. The internal guard is
    /// released before returning; callers never hold it across an await.
    pub fn with_session<T>(&self, id: SessionId, f: impl FnOnce(&Session) -> T) -> Option<T> {
        self.sessions.get(&id).map(|session| f(&session))
    }

    /// Mutable variant of [`Self::with_session`].
    pub fn with_session_mut<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Option<T> {
        self.sessions.get_mut(&id).map(|mut session| f(&mut session))
    }

    /// Store the reveal timer armed for a session, aborting any timer armed
    /// earlier so two timers never race on the same session.
    pub fn install_reveal_timer(&self, id: SessionId, handle: JoinHandle<()>) {
        if let Some(previous) = self.reveal_timers.insert(id, handle) {
            previous.abort();
        }
    }

    /// Abort and forget the session's armed reveal timer, if any.
    pub fn cancel_reveal_timer(&self, id: SessionId) {
        if let Some((_, handle)) = self.reveal_timers.remove(&id) {
            handle.abort();
        }
    }

    /// Timer callback: make the current question's answers visible.
    ///
    /// A replaced timer may already be past its sleep when it gets aborted, so
    /// the position the timer was armed for is re-checked before revealing.
    pub fn reveal_answers(&self, id: SessionId, armed_position: i64) {
        self.reveal_timers.remove(&id);
        if let Some(mut session) = self.sessions.get_mut(&id)
            && session.active
            && session.position == armed_position
        {
            session.answer_available = true;
        }
    }

    /// Abort every armed timer and drop every session. Test isolation only.
    pub fn reset(&self) {
        for entry in self.reveal_timers.iter() {
            entry.value().abort();
        }
        self.reveal_timers.clear();
        self.sessions.clear();
    }

    /// Number of sessions currently tracked, live or ended.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::Player;

    fn session(id: SessionId, game_id: GameId, active: bool) -> Session {
        let mut s = Session::new(id, game_id, Vec::new());
        s.active = active;
        s
    }

    #[test]
    fn generated_session_ids_avoid_collisions() {
        let registry = SessionRegistry::new();
        for _ in 0..64 {
            let id = registry.generate_session_id();
            registry.insert(session(id, 1, true));
        }
        assert_eq!(registry.session_count(), 64);
    }

    #[test]
    fn generated_player_ids_are_unique_across_sessions() {
        let registry = SessionRegistry::new();
        for game in 0..4 {
            let sid = registry.generate_session_id();
            registry.insert(session(sid, game, true));
            for _ in 0..8 {
                let pid = registry.generate_player_id();
                registry
                    .with_session_mut(sid, |s| {
                        assert!(s.players.insert(pid, Player::new(pid, "p".into(), 0)).is_none());
                    })
                    .unwrap();
            }
        }
    }

    #[test]
    fn active_lookup_requires_a_unique_match() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.active_session_for_game(7), None);

        registry.insert(session(100_001, 7, false));
        registry.insert(session(100_002, 7, true));
        assert_eq!(registry.active_session_for_game(7), Some(100_002));

        // Two active sessions violate the invariant; the lookup reports
        // "no unique active session" instead of picking one.
        registry.insert(session(100_003, 7, true));
        assert_eq!(registry.active_session_for_game(7), None);
    }

    #[test]
    fn inactive_lookup_collects_ended_sessions() {
        let registry = SessionRegistry::new();
        registry.insert(session(100_010, 9, false));
        registry.insert(session(100_011, 9, true));
        registry.insert(session(100_012, 9, false));
        assert_eq!(
            registry.inactive_sessions_for_game(9),
            vec![100_010, 100_012]
        );
    }

    #[test]
    fn player_resolution_scans_all_sessions() {
        let registry = SessionRegistry::new();
        registry.insert(session(100_020, 1, true));
        registry.insert(session(100_021, 2, true));
        registry
            .with_session_mut(100_021, |s| {
                s.players.insert(555_555, Player::new(555_555, "Alice".into(), 0));
            })
            .unwrap();

        assert_eq!(registry.session_for_player(555_555), Some(100_021));
        assert_eq!(registry.session_for_player(444_444), None);
    }

    #[tokio::test]
    async fn stale_reveal_fires_are_ignored() {
        let registry = SessionRegistry::new();
        let mut s = session(100_030, 1, true);
        s.position = 1;
        registry.insert(s);

        // Armed for question 0, firing after the session moved to question 1.
        registry.reveal_answers(100_030, 0);
        assert_eq!(
            registry.with_session(100_030, |s| s.answer_available),
            Some(false)
        );

        registry.reveal_answers(100_030, 1);
        assert_eq!(
            registry.with_session(100_030, |s| s.answer_available),
            Some(true)
        );
    }

    #[tokio::test]
    async fn reset_clears_sessions_and_timers() {
        let registry = SessionRegistry::new();
        registry.insert(session(100_040, 1, true));
        registry.install_reveal_timer(
            100_040,
            tokio::spawn(async {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }),
        );

        registry.reset();
        assert_eq!(registry.session_count(), 0);
        assert_eq!(registry.active_session_for_game(1), None);
    }
}
