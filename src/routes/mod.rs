use axum::{
    Router,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{error::AppError, services::auth_service, state::SharedState};

pub mod admin;
pub mod auth;
pub mod docs;
pub mod health;
pub mod play;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(auth::router())
        .merge(admin::router())
        .merge(play::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

/// Verified administrator identity extracted from the `Authorization` header.
///
/// Rejects requests whose token does not verify or whose subject no longer
/// holds a live login.
pub struct Authed {
    /// Email of the authenticated administrator.
    pub email: String,
}

impl FromRequestParts<SharedState> for Authed {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("malformed authorization header".into()))?;

        let email = state.tokens().verify(token)?;
        auth_service::ensure_active_admin(state, &email).await?;

        Ok(Authed { email })
    }
}
