use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the service status and the in-memory session count.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.registry().session_count())
}
