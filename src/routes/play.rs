use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::play::{
        AnswerRecordDto, JoinRequest, JoinResponse, PlayerQuestionResponse, PlayerStatusResponse,
        RevealedAnswersResponse, SubmitAnswersRequest,
    },
    error::AppError,
    services::player_service,
    state::{
        SharedState,
        session::{PlayerId, SessionId},
    },
};

/// Player-facing routes. No authentication: knowing the session code (and
/// later the player id) is the credential.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/play/join/{session_id}", post(join))
        .route("/play/{player_id}/status", get(status))
        .route("/play/{player_id}/question", get(question))
        .route(
            "/play/{player_id}/answer",
            get(revealed_answers).put(submit_answers),
        )
        .route("/play/{player_id}/results", get(results))
}

/// Join a session that is still in its lobby.
#[utoipa::path(
    post,
    path = "/play/join/{session_id}",
    tag = "play",
    params(("session_id" = u64, Path, description = "Join code of the session")),
    request_body = JoinRequest,
    responses(
        (status = 200, description = "Joined", body = JoinResponse)
    )
)]
pub async fn join(
    State(state): State<SharedState>,
    Path(session_id): Path<SessionId>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    payload.validate()?;
    let joined = player_service::join(&state, session_id, payload.name).await?;
    Ok(Json(joined))
}

/// Lobby poll: has the session started yet?
#[utoipa::path(
    get,
    path = "/play/{player_id}/status",
    tag = "play",
    params(("player_id" = u64, Path, description = "Identifier of the player")),
    responses(
        (status = 200, description = "Whether the session has started", body = PlayerStatusResponse)
    )
)]
pub async fn status(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerStatusResponse>, AppError> {
    let status = player_service::status(&state, player_id).await?;
    Ok(Json(status))
}

/// The question currently playing, correct answers withheld.
#[utoipa::path(
    get,
    path = "/play/{player_id}/question",
    tag = "play",
    params(("player_id" = u64, Path, description = "Identifier of the player")),
    responses(
        (status = 200, description = "Current question", body = PlayerQuestionResponse)
    )
)]
pub async fn question(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PlayerQuestionResponse>, AppError> {
    let question = player_service::current_question(&state, player_id).await?;
    Ok(Json(question))
}

/// Correct answers of the current question, once revealed.
#[utoipa::path(
    get,
    path = "/play/{player_id}/answer",
    tag = "play",
    params(("player_id" = u64, Path, description = "Identifier of the player")),
    responses(
        (status = 200, description = "Revealed correct answers", body = RevealedAnswersResponse)
    )
)]
pub async fn revealed_answers(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<RevealedAnswersResponse>, AppError> {
    let revealed = player_service::revealed_answers(&state, player_id).await?;
    Ok(Json(revealed))
}

/// Submit (or overwrite) answers for the current question.
#[utoipa::path(
    put,
    path = "/play/{player_id}/answer",
    tag = "play",
    params(("player_id" = u64, Path, description = "Identifier of the player")),
    request_body = SubmitAnswersRequest,
    responses(
        (status = 200, description = "Answers recorded")
    )
)]
pub async fn submit_answers(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<(), AppError> {
    player_service::submit_answers(&state, player_id, payload.answers).await?;
    Ok(())
}

/// The player's answer ledger, once the session has ended.
#[utoipa::path(
    get,
    path = "/play/{player_id}/results",
    tag = "play",
    params(("player_id" = u64, Path, description = "Identifier of the player")),
    responses(
        (status = 200, description = "One record per question", body = Vec<AnswerRecordDto>)
    )
)]
pub async fn results(
    State(state): State<SharedState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<Vec<AnswerRecordDto>>, AppError> {
    let records = player_service::results(&state, player_id).await?;
    Ok(Json(records))
}
