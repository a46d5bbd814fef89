use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dao::models::GameId,
    dto::admin::{
        GamesResponse, MutateRequest, MutationOutcome, PutGamesRequest, SessionResultsResponse,
        SessionStatusResponse,
    },
    error::AppError,
    routes::Authed,
    services::{game_service, session_service},
    state::{SharedState, session::SessionId},
};

/// Routes for game management and live session control.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/games", get(list_games).put(put_games))
        .route("/admin/game/{game_id}/mutate", post(mutate_game))
        .route("/admin/session/{session_id}/status", get(session_status))
        .route("/admin/session/{session_id}/results", get(session_results))
}

/// List the caller's games with their session history.
#[utoipa::path(
    get,
    path = "/admin/games",
    tag = "admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Stored games of the caller", body = GamesResponse)
    )
)]
pub async fn list_games(
    State(state): State<SharedState>,
    authed: Authed,
) -> Result<Json<GamesResponse>, AppError> {
    let games = game_service::list_games(&state, &authed.email).await?;
    Ok(Json(games))
}

/// Replace the caller's stored games with the submitted list.
#[utoipa::path(
    put,
    path = "/admin/games",
    tag = "admin",
    security(("bearer" = [])),
    request_body = PutGamesRequest,
    responses(
        (status = 200, description = "Reconciled games", body = GamesResponse)
    )
)]
pub async fn put_games(
    State(state): State<SharedState>,
    authed: Authed,
    Json(payload): Json<PutGamesRequest>,
) -> Result<Json<GamesResponse>, AppError> {
    payload.validate()?;
    let games = game_service::put_games(&state, &authed.email, payload).await?;
    Ok(Json(games))
}

/// Start, advance, or end the game's live session.
#[utoipa::path(
    post,
    path = "/admin/game/{game_id}/mutate",
    tag = "admin",
    security(("bearer" = [])),
    params(("game_id" = u64, Path, description = "Identifier of the game to mutate")),
    request_body = MutateRequest,
    responses(
        (status = 200, description = "Mutation applied", body = MutationOutcome)
    )
)]
pub async fn mutate_game(
    State(state): State<SharedState>,
    authed: Authed,
    Path(game_id): Path<GameId>,
    Json(payload): Json<MutateRequest>,
) -> Result<Json<MutationOutcome>, AppError> {
    let outcome =
        session_service::mutate_game(&state, &authed.email, game_id, payload.mutation_type).await?;
    Ok(Json(outcome))
}

/// Read-only projection of a session for the control panel.
#[utoipa::path(
    get,
    path = "/admin/session/{session_id}/status",
    tag = "admin",
    security(("bearer" = [])),
    params(("session_id" = u64, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Current session state", body = SessionStatusResponse)
    )
)]
pub async fn session_status(
    State(state): State<SharedState>,
    authed: Authed,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let status = session_service::session_status(&state, &authed.email, session_id).await?;
    Ok(Json(status))
}

/// Aggregated answer ledgers of an ended session.
#[utoipa::path(
    get,
    path = "/admin/session/{session_id}/results",
    tag = "admin",
    security(("bearer" = [])),
    params(("session_id" = u64, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Per-player results", body = SessionResultsResponse)
    )
)]
pub async fn session_results(
    State(state): State<SharedState>,
    authed: Authed,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionResultsResponse>, AppError> {
    let results = session_service::session_results(&state, &authed.email, session_id).await?;
    Ok(Json(results))
}
