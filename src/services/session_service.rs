//! Admin-driven session lifecycle (start/advance/end), the answer-reveal
//! timer, and the session status/results projections.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    dao::models::{GameEntity, GameId},
    dto::admin::{MutationOutcome, SessionResultsResponse, SessionStatusResponse},
    error::ServiceError,
    services::game_service,
    state::{
        Gate, SharedState,
        session::{Session, SessionId},
        state_machine::{self, AdvanceOutcome, MutationKind},
    },
};

/// Perform one lifecycle mutation on the game's session, serialized under the
/// `game` gate. Domain failures pass through unchanged; anything unexpected
/// is wrapped so the boundary layer maps it to a generic failure.
pub async fn mutate_game(
    state: &SharedState,
    owner: &str,
    game_id: GameId,
    kind: MutationKind,
) -> Result<MutationOutcome, ServiceError> {
    let result = state
        .serialized(Gate::Game, || async move {
            let game = game_service::assert_owns_game(&state.store(), owner, game_id).await?;

            match kind {
                MutationKind::Start => start_session(state, &game),
                MutationKind::Advance => advance_session(state, game_id),
                MutationKind::End => end_session(state, game_id),
            }
        })
        .await;

    result.map_err(|err| {
        if err.is_domain() {
            err
        } else {
            warn!(game_id, ?kind, error = %err, "session mutation failed");
            ServiceError::Internal("failed to mutate game session".into())
        }
    })
}

fn start_session(state: &SharedState, game: &GameEntity) -> Result<MutationOutcome, ServiceError> {
    let registry = state.registry();
    if registry.active_session_for_game(game.id).is_some() {
        return Err(ServiceError::InvalidInput(format!(
            "game `{}` already has an active session",
            game.id
        )));
    }

    let session_id = registry.generate_session_id();
    // Snapshot the question list by value; edits to the game definition after
    // this point must not reach the running session.
    registry.insert(Session::new(session_id, game.id, game.questions.clone()));

    info!(game_id = game.id, session_id, "session started");
    Ok(MutationOutcome::Started { session_id })
}

fn advance_session(state: &SharedState, game_id: GameId) -> Result<MutationOutcome, ServiceError> {
    let registry = state.registry();
    let session_id = require_active_session(state, game_id)?;

    let outcome = registry
        .with_session_mut(session_id, |session| {
            state_machine::advance(session, OffsetDateTime::now_utc())
        })
        .ok_or_else(|| ServiceError::Internal(format!("session `{session_id}` vanished")))??;

    let position = match outcome {
        AdvanceOutcome::Question { position, duration } => {
            arm_reveal_timer(state, session_id, position, duration);
            position
        }
        AdvanceOutcome::Finished { position } => {
            registry.cancel_reveal_timer(session_id);
            info!(game_id, session_id, "session ran out of questions and ended");
            position
        }
    };

    Ok(MutationOutcome::Advanced {
        position: position as i64,
    })
}

fn end_session(state: &SharedState, game_id: GameId) -> Result<MutationOutcome, ServiceError> {
    let registry = state.registry();
    let session_id = require_active_session(state, game_id)?;

    registry.cancel_reveal_timer(session_id);
    registry
        .with_session_mut(session_id, state_machine::end)
        .ok_or_else(|| ServiceError::Internal(format!("session `{session_id}` vanished")))?;

    info!(game_id, session_id, "session ended by admin");
    Ok(MutationOutcome::Ended)
}

fn require_active_session(state: &SharedState, game_id: GameId) -> Result<SessionId, ServiceError> {
    state
        .registry()
        .active_session_for_game(game_id)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!("game `{game_id}` has no active session"))
        })
}

/// Arm the one-shot timer that flips the current question from answer-hidden
/// to answer-revealed. Any timer armed earlier for this session is aborted
/// first, so rapid advances never leave two timers racing on one session.
fn arm_reveal_timer(state: &SharedState, session_id: SessionId, position: usize, duration: Duration) {
    let shared = Arc::clone(state);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        shared.registry().reveal_answers(session_id, position as i64);
    });
    state.registry().install_reveal_timer(session_id, handle);
}

/// Check that the session exists and its game belongs to the administrator,
/// returning the owning game id.
pub async fn assert_owns_session(
    state: &SharedState,
    owner: &str,
    session_id: SessionId,
) -> Result<GameId, ServiceError> {
    let game_id = state
        .registry()
        .with_session(session_id, |session| session.game_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    game_service::assert_owns_game(&state.store(), owner, game_id).await?;
    Ok(game_id)
}

/// Read-only session projection for the admin control panel. Deliberately
/// ungated: status polling tolerates a stale read.
pub async fn session_status(
    state: &SharedState,
    owner: &str,
    session_id: SessionId,
) -> Result<SessionStatusResponse, ServiceError> {
    assert_owns_session(state, owner, session_id).await?;
    state
        .registry()
        .with_session(session_id, |session| SessionStatusResponse::from(session))
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))
}

/// Aggregated answer ledgers of an ended session.
pub async fn session_results(
    state: &SharedState,
    owner: &str,
    session_id: SessionId,
) -> Result<SessionResultsResponse, ServiceError> {
    assert_owns_session(state, owner, session_id).await?;
    state
        .serialized(Gate::Session, || async move {
            state
                .registry()
                .with_session(session_id, |session| {
                    if session.active {
                        return Err(ServiceError::InvalidInput(
                            "session is still running; results are not available".into(),
                        ));
                    }
                    Ok(SessionResultsResponse::from(session))
                })
                .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::models::{QuestionEntity, UserEntity},
        dao::store::{EntityStore, memory::MemoryStore},
        state::AppState,
    };
    use serde_json::Map;

    const OWNER: &str = "owner@x.y";
    const GAME: GameId = 777_777;

    fn question(duration: Option<u64>, correct: &[u32]) -> QuestionEntity {
        QuestionEntity {
            duration,
            correct_answers: correct.to_vec(),
            extra: Map::new(),
        }
    }

    async fn test_state(questions: Vec<QuestionEntity>) -> SharedState {
        let store = Arc::new(MemoryStore::new());
        store
            .create_user(UserEntity {
                email: OWNER.into(),
                password: "pw".into(),
                name: "Owner".into(),
                session_active: true,
            })
            .await
            .unwrap();
        store
            .create_game(GameEntity {
                id: GAME,
                owner: OWNER.into(),
                name: "Quiz".into(),
                questions,
                extra: Map::new(),
            })
            .await
            .unwrap();
        AppState::new(AppConfig::default(), store)
    }

    async fn start(state: &SharedState) -> SessionId {
        match mutate_game(state, OWNER, GAME, MutationKind::Start).await.unwrap() {
            MutationOutcome::Started { session_id } => session_id,
            other => panic!("expected start outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_creates_a_lobby_session() {
        let state = test_state(vec![question(Some(5), &[1])]).await;
        let session_id = start(&state).await;

        let status = session_status(&state, OWNER, session_id).await.unwrap();
        assert!(status.active);
        assert_eq!(status.position, -1);
        assert!(!status.answer_available);
        assert!(status.iso_time_last_question_started.is_none());
        assert_eq!(status.questions.len(), 1);
        assert!(status.players.is_empty());
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_active() {
        let state = test_state(vec![question(Some(5), &[1])]).await;
        start(&state).await;

        let second = mutate_game(&state, OWNER, GAME, MutationKind::Start).await;
        assert!(matches!(second, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn concurrent_starts_admit_exactly_one() {
        let state = test_state(vec![question(Some(5), &[1])]).await;

        let (first, second) = tokio::join!(
            mutate_game(&state, OWNER, GAME, MutationKind::Start),
            mutate_game(&state, OWNER, GAME, MutationKind::Start),
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(matches!(
            [first, second].into_iter().find(|r| r.is_err()).unwrap(),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn advance_past_last_question_auto_ends() {
        let state = test_state(vec![question(Some(5), &[1]), question(Some(5), &[2])]).await;
        let session_id = start(&state).await;

        for expected in [0, 1, 2] {
            let outcome = mutate_game(&state, OWNER, GAME, MutationKind::Advance)
                .await
                .unwrap();
            assert_eq!(outcome, MutationOutcome::Advanced { position: expected });
        }

        let status = session_status(&state, OWNER, session_id).await.unwrap();
        assert!(!status.active);
        // No END was issued; the session closed itself, so a further advance
        // finds nothing active.
        let further = mutate_game(&state, OWNER, GAME, MutationKind::Advance).await;
        assert!(matches!(further, Err(ServiceError::InvalidInput(_))));

        // …and results are now queryable.
        session_results(&state, OWNER, session_id).await.unwrap();
    }

    #[tokio::test]
    async fn end_without_active_session_is_an_input_error() {
        let state = test_state(vec![question(Some(5), &[1])]).await;
        let result = mutate_game(&state, OWNER, GAME, MutationKind::End).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn ended_game_can_start_again_and_history_accumulates() {
        let state = test_state(vec![question(Some(5), &[1])]).await;
        let first = start(&state).await;
        mutate_game(&state, OWNER, GAME, MutationKind::End).await.unwrap();

        let second = start(&state).await;
        assert_ne!(first, second);
        assert_eq!(state.registry().inactive_sessions_for_game(GAME), vec![first]);
    }

    #[tokio::test]
    async fn question_snapshot_is_isolated_from_game_edits() {
        let state = test_state(vec![question(Some(5), &[1])]).await;
        let session_id = start(&state).await;

        let mut edited = state.store().find_game(GAME).await.unwrap().unwrap();
        edited.questions = vec![question(Some(99), &[7]), question(Some(99), &[8])];
        assert!(state.store().update_game(edited).await.unwrap());

        let status = session_status(&state, OWNER, session_id).await.unwrap();
        assert_eq!(status.questions.len(), 1);
        assert_eq!(status.questions[0].duration, Some(5));
    }

    #[tokio::test]
    async fn mutation_requires_ownership() {
        let state = test_state(vec![question(Some(5), &[1])]).await;
        let result = mutate_game(&state, "other@x.y", GAME, MutationKind::Start).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn reset_wipes_sessions_and_storage() {
        let state = test_state(vec![question(Some(5), &[1])]).await;
        start(&state).await;

        state.reset().await.unwrap();
        assert_eq!(state.registry().session_count(), 0);
        assert!(state.store().find_game(GAME).await.unwrap().is_none());
        assert!(state.store().find_user(OWNER.into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn advance_rejects_question_without_duration() {
        let state = test_state(vec![question(None, &[1])]).await;
        let session_id = start(&state).await;

        let result = mutate_game(&state, OWNER, GAME, MutationKind::Advance).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));

        // The failed advance left the session in the lobby.
        let status = session_status(&state, OWNER, session_id).await.unwrap();
        assert_eq!(status.position, -1);
        assert!(status.active);
    }
}
