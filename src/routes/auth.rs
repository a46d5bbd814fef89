use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::{
        auth::{LoginRequest, RegisterRequest, TokenResponse},
        common::ActionResponse,
    },
    error::AppError,
    routes::Authed,
    services::auth_service,
    state::SharedState,
};

/// Routes handling administrator registration, login, and logout.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/auth/register", post(register))
        .route("/admin/auth/login", post(login))
        .route("/admin/auth/logout", post(logout))
}

/// Create an administrator account and return a bearer token.
#[utoipa::path(
    post,
    path = "/admin/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = TokenResponse)
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;
    let token = auth_service::register(&state, payload).await?;
    Ok(Json(token))
}

/// Log an administrator in and return a bearer token.
#[utoipa::path(
    post,
    path = "/admin/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse)
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;
    let token = auth_service::login(&state, payload).await?;
    Ok(Json(token))
}

/// Revoke the caller's live login.
#[utoipa::path(
    post,
    path = "/admin/auth/logout",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Logged out", body = ActionResponse)
    )
)]
pub async fn logout(
    State(state): State<SharedState>,
    authed: Authed,
) -> Result<Json<ActionResponse>, AppError> {
    let response = auth_service::logout(&state, &authed.email).await?;
    Ok(Json(response))
}
