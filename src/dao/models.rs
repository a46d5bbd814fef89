use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Numeric identifier of a stored game definition.
pub type GameId = u64;

/// Registered administrator account persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Login email, primary key.
    pub email: String,
    /// Password as registered.
    pub password: String,
    /// Display name of the administrator.
    pub name: String,
    /// Whether the administrator currently holds a live login session.
    pub session_active: bool,
}

/// Partial update applied to a stored user record.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    /// New value for the live-login flag, when present.
    pub session_active: Option<bool>,
}

/// Single question inside a game definition.
///
/// Only the answer window and the correct-answer set matter to the session
/// core; whatever else the authoring UI stores (text, media, point values)
/// rides along untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct QuestionEntity {
    /// Answer window in seconds. Questions without one cannot be played.
    pub duration: Option<u64>,
    /// Identifiers of the correct answer choices.
    #[serde(default)]
    pub correct_answers: Vec<u32>,
    /// Display fields opaque to the backend.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// Aggregate game definition persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: GameId,
    /// Email of the administrator owning this game.
    pub owner: String,
    /// Display name of the quiz.
    pub name: String,
    /// Ordered question list played by sessions of this game.
    pub questions: Vec<QuestionEntity>,
    /// Display fields opaque to the backend (thumbnail and the like).
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}
