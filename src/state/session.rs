use indexmap::IndexMap;
use time::OffsetDateTime;

use crate::dao::models::{GameId, QuestionEntity};

/// Numeric identifier of a live session; doubles as the join code players type.
pub type SessionId = u64;
/// Numeric identifier of a joined player, unique across all sessions.
pub type PlayerId = u64;

/// Position value while a session sits in the lobby.
pub const LOBBY_POSITION: i64 = -1;

/// One answer slot of a player, one per question of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerRecord {
    /// When the answered question's window opened; copied from the session at
    /// submission time.
    pub question_started_at: Option<OffsetDateTime>,
    /// When the player last submitted this slot.
    pub answered_at: Option<OffsetDateTime>,
    /// Submitted choice identifiers, as sent.
    pub answers: Vec<u32>,
    /// Whether the submitted set matched the correct set exactly.
    pub correct: bool,
}

/// Player info tracked during a live session.
#[derive(Debug, Clone)]
pub struct Player {
    /// Unique player identifier.
    pub id: PlayerId,
    /// Display name chosen when joining.
    pub name: String,
    /// One pre-initialized answer slot per question of the session.
    pub answers: Vec<AnswerRecord>,
}

impl Player {
    /// Build a player with every answer slot blank.
    pub fn new(id: PlayerId, name: String, question_count: usize) -> Self {
        Self {
            id,
            name,
            answers: vec![AnswerRecord::default(); question_count],
        }
    }
}

/// In-memory state of one live (or finished) game session.
///
/// The question list is a snapshot taken at start time; edits to the game
/// definition after that point must not reach an in-flight session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session identifier / join code.
    pub id: SessionId,
    /// Game definition this session was started from.
    pub game_id: GameId,
    /// Index into `questions`; [`LOBBY_POSITION`] until the first advance.
    pub position: i64,
    /// When the current question's answer window opened.
    pub question_started_at: Option<OffsetDateTime>,
    /// Snapshot of the game's questions, isolated from later edits.
    pub questions: Vec<QuestionEntity>,
    /// `true` from start until the session ends.
    pub active: bool,
    /// Whether the current question's correct answers may be shown.
    pub answer_available: bool,
    /// Joined players in join order.
    pub players: IndexMap<PlayerId, Player>,
}

impl Session {
    /// Build a fresh session sitting in the lobby.
    pub fn new(id: SessionId, game_id: GameId, questions: Vec<QuestionEntity>) -> Self {
        Self {
            id,
            game_id,
            position: LOBBY_POSITION,
            question_started_at: None,
            questions,
            active: true,
            answer_available: false,
            players: IndexMap::new(),
        }
    }

    /// Number of questions in this session's snapshot.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Whether the first question has been opened yet.
    pub fn has_started(&self) -> bool {
        self.question_started_at.is_some()
    }

    /// The question currently being played, if the position points at one.
    pub fn current_question(&self) -> Option<(usize, &QuestionEntity)> {
        let position = usize::try_from(self.position).ok()?;
        self.questions.get(position).map(|q| (position, q))
    }
}
