//! Lifecycle transitions for a live session: lobby, per-question play, end.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::state::session::Session;

/// Lifecycle stage derived from a session's bookkeeping fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Players may still join; no question has been opened.
    Lobby,
    /// The question at this index is being played.
    Question(usize),
    /// The session has ended; results are queryable.
    Finished,
}

/// Admin-requested mutation of a game's session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationKind {
    /// Open a fresh session for the game.
    Start,
    /// Move the active session to its next question (or finish it).
    Advance,
    /// Stop the active session early.
    End,
}

/// Result of advancing a session by one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// A question opened; its reveal timer must be armed for `duration`.
    Question {
        /// Index of the question now playing.
        position: usize,
        /// Answer window before the correct answers become visible.
        duration: Duration,
    },
    /// The position ran past the last question; the session ended.
    Finished {
        /// Final position (equal to the question count).
        position: usize,
    },
}

/// Error returned when a transition cannot be performed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The target question carries no answer window.
    #[error("question {position} has no duration configured")]
    MissingDuration {
        /// Index of the question that cannot be played.
        position: usize,
    },
}

/// Inspect the lifecycle stage of a session.
pub fn phase(session: &Session) -> SessionPhase {
    if !session.active {
        SessionPhase::Finished
    } else if session.position < 0 {
        SessionPhase::Lobby
    } else {
        SessionPhase::Question(session.position as usize)
    }
}

/// Advance the session by one position: stamp the clock, hide answers again,
/// and either open the next question or finish the session when the position
/// runs past the snapshot. The session is left untouched on error.
pub fn advance(session: &mut Session, now: OffsetDateTime) -> Result<AdvanceOutcome, TransitionError> {
    let next = (session.position + 1) as usize;

    let duration = match session.questions.get(next) {
        Some(question) => Some(
            question
                .duration
                .ok_or(TransitionError::MissingDuration { position: next })?,
        ),
        None => None,
    };

    session.position = next as i64;
    session.answer_available = false;
    session.question_started_at = Some(now);

    match duration {
        Some(secs) => Ok(AdvanceOutcome::Question {
            position: next,
            duration: Duration::from_secs(secs),
        }),
        None => {
            end(session);
            Ok(AdvanceOutcome::Finished { position: next })
        }
    }
}

/// Deactivate the session. Terminal: there is no way back into play.
pub fn end(session: &mut Session) {
    session.active = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::QuestionEntity;
    use serde_json::Map;

    fn question(duration: Option<u64>) -> QuestionEntity {
        QuestionEntity {
            duration,
            correct_answers: vec![0],
            extra: Map::new(),
        }
    }

    fn session(durations: &[Option<u64>]) -> Session {
        Session::new(1, 42, durations.iter().map(|d| question(*d)).collect())
    }

    fn advance_ok(session: &mut Session) -> AdvanceOutcome {
        advance(session, OffsetDateTime::UNIX_EPOCH).unwrap()
    }

    #[test]
    fn fresh_session_sits_in_lobby() {
        let s = session(&[Some(5)]);
        assert_eq!(phase(&s), SessionPhase::Lobby);
        assert!(!s.has_started());
        assert!(s.current_question().is_none());
    }

    #[test]
    fn advance_walks_through_questions_then_finishes() {
        let mut s = session(&[Some(5), Some(10)]);

        assert_eq!(
            advance_ok(&mut s),
            AdvanceOutcome::Question {
                position: 0,
                duration: Duration::from_secs(5)
            }
        );
        assert_eq!(phase(&s), SessionPhase::Question(0));
        assert!(s.has_started());

        assert_eq!(
            advance_ok(&mut s),
            AdvanceOutcome::Question {
                position: 1,
                duration: Duration::from_secs(10)
            }
        );

        assert_eq!(advance_ok(&mut s), AdvanceOutcome::Finished { position: 2 });
        assert_eq!(phase(&s), SessionPhase::Finished);
        assert!(!s.active);
    }

    #[test]
    fn advance_resets_reveal_flag_and_stamps_clock() {
        let mut s = session(&[Some(5), Some(5)]);
        advance_ok(&mut s);
        s.answer_available = true;

        let now = OffsetDateTime::UNIX_EPOCH + Duration::from_secs(60);
        advance(&mut s, now).unwrap();
        assert!(!s.answer_available);
        assert_eq!(s.question_started_at, Some(now));
    }

    #[test]
    fn advance_on_empty_snapshot_finishes_immediately() {
        let mut s = session(&[]);
        assert_eq!(advance_ok(&mut s), AdvanceOutcome::Finished { position: 0 });
        assert!(!s.active);
    }

    #[test]
    fn missing_duration_fails_without_mutating() {
        let mut s = session(&[None]);
        let err = advance(&mut s, OffsetDateTime::UNIX_EPOCH).unwrap_err();
        assert_eq!(err, TransitionError::MissingDuration { position: 0 });
        assert_eq!(phase(&s), SessionPhase::Lobby);
        assert!(s.question_started_at.is_none());
    }

    #[test]
    fn end_is_terminal_from_any_question() {
        let mut s = session(&[Some(5), Some(5), Some(5)]);
        advance_ok(&mut s);
        end(&mut s);
        assert_eq!(phase(&s), SessionPhase::Finished);
        // The stamp survives so "did this session ever start" stays answerable.
        assert!(s.has_started());
    }

    #[test]
    fn mutation_kind_uses_wire_spelling() {
        assert_eq!(
            serde_json::from_str::<MutationKind>("\"ADVANCE\"").unwrap(),
            MutationKind::Advance
        );
        assert_eq!(
            serde_json::to_string(&MutationKind::Start).unwrap(),
            "\"START\""
        );
    }
}
