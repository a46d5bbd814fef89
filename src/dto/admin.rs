use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{GameEntity, GameId, QuestionEntity},
    dto::{format_timestamp, play::AnswerRecordDto, validation::validate_display_name},
    state::{
        session::{Session, SessionId},
        state_machine::MutationKind,
    },
};

/// One game definition as submitted by the dashboard.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GameInput {
    /// Present when updating an existing game; omitted for new ones.
    pub id: Option<GameId>,
    /// Display name of the quiz.
    pub name: String,
    /// Ordered question list.
    pub questions: Vec<QuestionEntity>,
    /// Display fields opaque to the backend.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl Validate for GameInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_display_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Full game list replacing the owner's stored games.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PutGamesRequest {
    /// The owner's complete game list; stored games absent from it are
    /// deleted.
    pub games: Vec<GameInput>,
}

impl Validate for PutGamesRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for game in &self.games {
            if let Err(game_errors) = game.validate() {
                errors.merge_self("games", Err(game_errors));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// One stored game as shown on the dashboard, with session history attached.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    /// Primary key of the game.
    pub id: GameId,
    /// Display name of the quiz.
    pub name: String,
    /// Ordered question list.
    pub questions: Vec<QuestionEntity>,
    /// Id of the currently running session, if one exists.
    pub active: Option<SessionId>,
    /// Ids of ended sessions, for history display.
    pub old_sessions: Vec<SessionId>,
    /// Display fields opaque to the backend.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl GameSummary {
    /// Combine a stored game with its session history.
    pub fn new(game: GameEntity, active: Option<SessionId>, old_sessions: Vec<SessionId>) -> Self {
        Self {
            id: game.id,
            name: game.name,
            questions: game.questions,
            active,
            old_sessions,
            extra: game.extra,
        }
    }
}

/// Stored games of the requesting owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct GamesResponse {
    /// All games owned by the requesting administrator.
    pub games: Vec<GameSummary>,
}

/// Session lifecycle mutation requested for a game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MutateRequest {
    /// Which transition to perform.
    pub mutation_type: MutationKind,
}

/// Outcome of a session lifecycle mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MutationOutcome {
    /// A fresh session was opened.
    Started {
        /// Join code of the new session.
        session_id: SessionId,
    },
    /// The session moved to a new position (possibly finishing it).
    Advanced {
        /// Position after the advance.
        position: i64,
    },
    /// The session was stopped early.
    Ended,
}

/// Read-only projection of a session for the admin control panel.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatusResponse {
    /// Whether the session is still running.
    pub active: bool,
    /// Whether the current question's answers are visible.
    pub answer_available: bool,
    /// Current position; `-1` while in the lobby.
    pub position: i64,
    /// RFC 3339 stamp of when the current question's window opened.
    pub iso_time_last_question_started: Option<String>,
    /// The session's question snapshot, correct answers included.
    pub questions: Vec<QuestionEntity>,
    /// Display names of joined players, in join order.
    pub players: Vec<String>,
}

impl From<&Session> for SessionStatusResponse {
    fn from(session: &Session) -> Self {
        Self {
            active: session.active,
            answer_available: session.answer_available,
            position: session.position,
            iso_time_last_question_started: session.question_started_at.map(format_timestamp),
            questions: session.questions.clone(),
            players: session
                .players
                .values()
                .map(|player| player.name.clone())
                .collect(),
        }
    }
}

/// Final answer ledger of one player.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerResultEntry {
    /// Display name the player joined with.
    pub name: String,
    /// One record per question of the session.
    pub answers: Vec<AnswerRecordDto>,
}

/// Aggregated results of an ended session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResultsResponse {
    /// One entry per joined player, in join order.
    pub results: Vec<PlayerResultEntry>,
}

impl From<&Session> for SessionResultsResponse {
    fn from(session: &Session) -> Self {
        Self {
            results: session
                .players
                .values()
                .map(|player| PlayerResultEntry {
                    name: player.name.clone(),
                    answers: player.answers.iter().map(AnswerRecordDto::from).collect(),
                })
                .collect(),
        }
    }
}
