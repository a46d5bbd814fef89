//! Player-facing operations: joining a lobby, polling for the current
//! question, submitting answers inside the timing window, and reading
//! results once the session has ended. Everything here runs under the
//! `session` gate.

use time::OffsetDateTime;
use tracing::info;

use crate::{
    dto::play::{
        AnswerRecordDto, JoinResponse, PlayerQuestionResponse, PlayerStatusResponse,
        RevealedAnswersResponse,
    },
    error::ServiceError,
    state::{
        Gate, SharedState,
        session::{AnswerRecord, Player, PlayerId, SessionId},
        state_machine::{self, SessionPhase},
    },
};

/// Join a session that is still in its lobby.
pub async fn join(
    state: &SharedState,
    session_id: SessionId,
    name: String,
) -> Result<JoinResponse, ServiceError> {
    state
        .serialized(Gate::Session, || async move {
            if name.trim().is_empty() {
                return Err(ServiceError::InvalidInput(
                    "player name must not be empty".into(),
                ));
            }

            let registry = state.registry();
            // Drawn before entering the session so the uniqueness scan never
            // runs while the session's shard is held.
            let player_id = registry.generate_player_id();

            registry
                .with_session_mut(session_id, |session| {
                    match state_machine::phase(session) {
                        SessionPhase::Lobby => {}
                        SessionPhase::Finished => {
                            return Err(ServiceError::InvalidInput(format!(
                                "session `{session_id}` is not an active session"
                            )));
                        }
                        SessionPhase::Question(_) => {
                            return Err(ServiceError::InvalidInput(
                                "session has already begun".into(),
                            ));
                        }
                    }

                    let player = Player::new(player_id, name.clone(), session.question_count());
                    session.players.insert(player_id, player);
                    Ok(())
                })
                .ok_or_else(|| {
                    ServiceError::InvalidInput(format!(
                        "session `{session_id}` is not an active session"
                    ))
                })??;

            info!(session_id, player_id, "player joined");
            Ok(JoinResponse { player_id })
        })
        .await
}

/// Lobby poll: has the player's session opened its first question?
pub async fn status(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<PlayerStatusResponse, ServiceError> {
    state
        .serialized(Gate::Session, || async move {
            let session_id = resolve_session(state, player_id)?;
            let started = state
                .registry()
                .with_session(session_id, |session| session.has_started())
                .unwrap_or(false);
            Ok(PlayerStatusResponse { started })
        })
        .await
}

/// The question currently playing, correct answers withheld.
pub async fn current_question(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<PlayerQuestionResponse, ServiceError> {
    state
        .serialized(Gate::Session, || async move {
            let session_id = resolve_session(state, player_id)?;
            state
                .registry()
                .with_session(session_id, |session| {
                    let started_at = session
                        .question_started_at
                        .ok_or_else(not_started_error)?;
                    let (_, question) = session.current_question().ok_or_else(|| {
                        ServiceError::InvalidInput("question position is out of range".into())
                    })?;

                    Ok(PlayerQuestionResponse::new(question, started_at))
                })
                .ok_or_else(session_gone_error)?
        })
        .await
}

/// Correct-answer set of the current question, once the reveal timer fired.
pub async fn revealed_answers(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<RevealedAnswersResponse, ServiceError> {
    state
        .serialized(Gate::Session, || async move {
            let session_id = resolve_session(state, player_id)?;
            state
                .registry()
                .with_session(session_id, |session| {
                    if !session.has_started() {
                        return Err(not_started_error());
                    }
                    if !session.answer_available {
                        return Err(ServiceError::InvalidInput(
                            "answers are not available yet".into(),
                        ));
                    }
                    let (_, question) = session.current_question().ok_or_else(|| {
                        ServiceError::InvalidInput("question position is out of range".into())
                    })?;
                    Ok(RevealedAnswersResponse {
                        answers: question.correct_answers.clone(),
                    })
                })
                .ok_or_else(session_gone_error)?
        })
        .await
}

/// Submit (or re-submit) answers for the current question. Last write wins
/// while the window is open; nothing is accepted once answers are revealed.
pub async fn submit_answers(
    state: &SharedState,
    player_id: PlayerId,
    answers: Vec<u32>,
) -> Result<(), ServiceError> {
    state
        .serialized(Gate::Session, || async move {
            if answers.is_empty() {
                return Err(ServiceError::InvalidInput(
                    "at least one answer must be provided".into(),
                ));
            }

            let session_id = resolve_session(state, player_id)?;
            state
                .registry()
                .with_session_mut(session_id, |session| {
                    let started_at = session.question_started_at;
                    if started_at.is_none() {
                        return Err(not_started_error());
                    }
                    if session.answer_available {
                        return Err(ServiceError::InvalidInput(
                            "answers can no longer be submitted for this question".into(),
                        ));
                    }
                    let (position, question) = session.current_question().ok_or_else(|| {
                        ServiceError::InvalidInput("question position is out of range".into())
                    })?;

                    let correct = sets_match(&answers, &question.correct_answers);
                    let record = AnswerRecord {
                        question_started_at: started_at,
                        answered_at: Some(OffsetDateTime::now_utc()),
                        answers,
                        correct,
                    };

                    let player = session.players.get_mut(&player_id).ok_or_else(|| {
                        ServiceError::NotFound(format!("player `{player_id}` not found"))
                    })?;
                    player.answers[position] = record;
                    Ok(())
                })
                .ok_or_else(session_gone_error)?
        })
        .await
}

/// The player's full answer ledger, available once the session has ended.
pub async fn results(
    state: &SharedState,
    player_id: PlayerId,
) -> Result<Vec<AnswerRecordDto>, ServiceError> {
    state
        .serialized(Gate::Session, || async move {
            let session_id = resolve_session(state, player_id)?;
            state
                .registry()
                .with_session(session_id, |session| {
                    if session.active {
                        return Err(ServiceError::InvalidInput(
                            "session is still running; results are not available".into(),
                        ));
                    }
                    if !session.has_started() {
                        return Err(ServiceError::InvalidInput(
                            "session ended without ever starting".into(),
                        ));
                    }
                    let player = session.players.get(&player_id).ok_or_else(|| {
                        ServiceError::NotFound(format!("player `{player_id}` not found"))
                    })?;
                    Ok(player.answers.iter().map(AnswerRecordDto::from).collect())
                })
                .ok_or_else(session_gone_error)?
        })
        .await
}

/// Linear scan over all sessions for the one containing the player.
fn resolve_session(state: &SharedState, player_id: PlayerId) -> Result<SessionId, ServiceError> {
    state
        .registry()
        .session_for_player(player_id)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{player_id}` not found")))
}

/// Exact set equality between the submitted and correct answer identifiers,
/// ignoring order: a strict subset or superset is wrong.
fn sets_match(submitted: &[u32], correct: &[u32]) -> bool {
    let mut submitted = submitted.to_vec();
    let mut correct = correct.to_vec();
    submitted.sort_unstable();
    submitted.dedup();
    correct.sort_unstable();
    correct.dedup();
    submitted == correct
}

fn not_started_error() -> ServiceError {
    ServiceError::InvalidInput("session has not started yet".into())
}

fn session_gone_error() -> ServiceError {
    ServiceError::Internal("session vanished while handling a player request".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::models::{GameEntity, GameId, QuestionEntity, UserEntity},
        dao::store::{EntityStore, memory::MemoryStore},
        dto::admin::MutationOutcome,
        services::session_service,
        state::{AppState, state_machine::MutationKind},
    };
    use serde_json::Map;
    use std::sync::Arc;
    use std::time::Duration;

    const OWNER: &str = "owner@x.y";
    const GAME: GameId = 888_888;

    fn question(duration: u64, correct: &[u32]) -> QuestionEntity {
        QuestionEntity {
            duration: Some(duration),
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
        match session_service::mutate_game(state, OWNER, GAME, MutationKind::Start)
            .await
            .unwrap()
        {
            MutationOutcome::Started { session_id } => session_id,
            other => panic!("expected start outcome, got {other:?}"),
        }
    }

    async fn advance(state: &SharedState) {
        session_service::mutate_game(state, OWNER, GAME, MutationKind::Advance)
            .await
            .unwrap();
    }

    async fn end(state: &SharedState) {
        session_service::mutate_game(state, OWNER, GAME, MutationKind::End)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn full_game_round_trip() {
        let state = test_state(vec![question(30, &[7])]).await;
        let session_id = start(&state).await;

        let joined = join(&state, session_id, "Alice".into()).await.unwrap();
        assert!(!status(&state, joined.player_id).await.unwrap().started);

        advance(&state).await;
        assert!(status(&state, joined.player_id).await.unwrap().started);

        let current = current_question(&state, joined.player_id).await.unwrap();
        assert_eq!(current.question.duration, Some(30));

        submit_answers(&state, joined.player_id, vec![7]).await.unwrap();
        end(&state).await;

        let records = results(&state, joined.player_id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].correct);
        assert_eq!(records[0].answers, vec![7]);
        assert!(records[0].answered_at.is_some());

        let aggregated = session_service::session_results(&state, OWNER, session_id)
            .await
            .unwrap();
        assert_eq!(aggregated.results.len(), 1);
        assert_eq!(aggregated.results[0].name, "Alice");
    }

    #[tokio::test]
    async fn join_is_lobby_only() {
        let state = test_state(vec![question(30, &[1])]).await;
        let session_id = start(&state).await;
        advance(&state).await;

        let late = join(&state, session_id, "Bob".into()).await;
        match late {
            Err(ServiceError::InvalidInput(message)) => {
                assert_eq!(message, "session has already begun")
            }
            other => panic!("expected input error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn join_rejects_blank_names_and_dead_sessions() {
        let state = test_state(vec![question(30, &[1])]).await;
        let session_id = start(&state).await;

        assert!(matches!(
            join(&state, session_id, "   ".into()).await,
            Err(ServiceError::InvalidInput(_))
        ));

        end(&state).await;
        assert!(matches!(
            join(&state, session_id, "Bob".into()).await,
            Err(ServiceError::InvalidInput(_))
        ));

        // Unknown session ids read the same as dead ones.
        assert!(matches!(
            join(&state, 1, "Bob".into()).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_opens_after_the_question_duration() {
        let state = test_state(vec![question(1, &[3, 5])]).await;
        let session_id = start(&state).await;
        let joined = join(&state, session_id, "Alice".into()).await.unwrap();

        advance(&state).await;
        assert!(matches!(
            revealed_answers(&state, joined.player_id).await,
            Err(ServiceError::InvalidInput(_))
        ));

        // Let the armed 1s timer fire.
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let revealed = revealed_answers(&state, joined.player_id).await.unwrap();
        assert_eq!(revealed.answers, vec![3, 5]);

        // The window is closed: submissions are rejected now.
        assert!(matches!(
            submit_answers(&state, joined.player_id, vec![3, 5]).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_advance_cancels_the_stale_timer() {
        let state = test_state(vec![question(1, &[1]), question(600, &[2])]).await;
        let session_id = start(&state).await;
        let joined = join(&state, session_id, "Alice".into()).await.unwrap();

        advance(&state).await;
        advance(&state).await; // re-arms before question 0's timer fires

        tokio::time::sleep(Duration::from_secs(2)).await;
        // Question 0's timer was cancelled; question 1's 600s timer has not
        // fired, so nothing may be revealed.
        assert!(matches!(
            revealed_answers(&state, joined.player_id).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn resubmission_wins_while_window_open() {
        let state = test_state(vec![question(600, &[2, 4])]).await;
        let session_id = start(&state).await;
        let joined = join(&state, session_id, "Alice".into()).await.unwrap();
        advance(&state).await;

        submit_answers(&state, joined.player_id, vec![1]).await.unwrap();
        submit_answers(&state, joined.player_id, vec![4, 2]).await.unwrap();
        end(&state).await;

        let records = results(&state, joined.player_id).await.unwrap();
        assert_eq!(records[0].answers, vec![4, 2]);
        assert!(records[0].correct);
    }

    #[tokio::test]
    async fn correctness_is_exact_set_equality() {
        let state = test_state(vec![
            question(600, &[2, 7]),
            question(600, &[2, 7]),
            question(600, &[2, 7]),
            question(600, &[2, 7]),
        ])
        .await;
        let session_id = start(&state).await;
        let joined = join(&state, session_id, "Alice".into()).await.unwrap();

        // (submission, expected correctness) pairs, one question each.
        let cases: [(&[u32], bool); 4] = [
            (&[7, 2], true),   // same set, different order
            (&[7], false),     // strict subset
            (&[2, 7, 9], false), // strict superset
            (&[1, 3], false),  // disjoint
        ];

        for (submission, _) in cases {
            advance(&state).await;
            submit_answers(&state, joined.player_id, submission.to_vec())
                .await
                .unwrap();
        }
        end(&state).await;

        let records = results(&state, joined.player_id).await.unwrap();
        for ((_, expected), record) in cases.iter().zip(&records) {
            assert_eq!(record.correct, *expected, "submission {:?}", record.answers);
        }
    }

    #[tokio::test]
    async fn results_require_an_ended_and_started_session() {
        let state = test_state(vec![question(600, &[1])]).await;
        let session_id = start(&state).await;
        let joined = join(&state, session_id, "Alice".into()).await.unwrap();

        assert!(matches!(
            results(&state, joined.player_id).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            session_service::session_results(&state, OWNER, session_id).await,
            Err(ServiceError::InvalidInput(_))
        ));

        // Ending straight from the lobby: the session never started, so
        // per-player results stay unavailable.
        end(&state).await;
        assert!(matches!(
            results(&state, joined.player_id).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn submissions_need_content_and_a_running_question() {
        let state = test_state(vec![question(600, &[1])]).await;
        let session_id = start(&state).await;
        let joined = join(&state, session_id, "Alice".into()).await.unwrap();

        assert!(matches!(
            submit_answers(&state, joined.player_id, Vec::new()).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            submit_answers(&state, joined.player_id, vec![1]).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            current_question(&state, joined.player_id).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            status(&state, 424_242).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
