use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::QuestionEntity,
    dto::{format_timestamp, validation::validate_display_name},
    state::session::{AnswerRecord, PlayerId},
};

/// Payload joining a session lobby.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    /// Display name shown on the session scoreboard.
    pub name: String,
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_display_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Identifier handed to a freshly joined player.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    /// Id to present on all subsequent play requests.
    pub player_id: PlayerId,
}

/// Lobby polling result.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatusResponse {
    /// Whether the session has opened its first question.
    pub started: bool,
}

/// A question as shown to players: the correct-answer set is stripped.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicQuestion {
    /// Answer window in seconds.
    pub duration: Option<u64>,
    /// Display fields opaque to the backend.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl From<&QuestionEntity> for PublicQuestion {
    fn from(question: &QuestionEntity) -> Self {
        Self {
            duration: question.duration,
            extra: question.extra.clone(),
        }
    }
}

/// The question currently playing, with the window-open stamp merged in so
/// clients can run their own countdown.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerQuestionResponse {
    /// The current question, correct answers withheld.
    #[serde(flatten)]
    pub question: PublicQuestion,
    /// RFC 3339 stamp of when the answer window opened.
    pub iso_time_last_question_started: String,
}

impl PlayerQuestionResponse {
    /// Strip the correct answers off a question and merge in the window-open
    /// stamp.
    pub fn new(question: &QuestionEntity, started_at: time::OffsetDateTime) -> Self {
        Self {
            question: PublicQuestion::from(question),
            iso_time_last_question_started: format_timestamp(started_at),
        }
    }
}

/// Correct-answer set of the current question, once revealed.
#[derive(Debug, Serialize, ToSchema)]
pub struct RevealedAnswersResponse {
    /// Identifiers of the correct answer choices.
    pub answers: Vec<u32>,
}

/// Payload submitting (or re-submitting) answers for the current question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswersRequest {
    /// Identifiers of the selected answer choices, any order.
    pub answers: Vec<u32>,
}

/// One answer slot of a player as exposed in results.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerRecordDto {
    /// RFC 3339 stamp of when the question's window opened.
    pub question_started_at: Option<String>,
    /// RFC 3339 stamp of the last submission, if any.
    pub answered_at: Option<String>,
    /// Submitted choice identifiers.
    pub answers: Vec<u32>,
    /// Whether the submission matched the correct set exactly.
    pub correct: bool,
}

impl From<&AnswerRecord> for AnswerRecordDto {
    fn from(record: &AnswerRecord) -> Self {
        Self {
            question_started_at: record.question_started_at.map(format_timestamp),
            answered_at: record.answered_at.map(format_timestamp),
            answers: record.answers.clone(),
            correct: record.correct,
        }
    }
}
