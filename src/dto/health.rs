use serde::Serialize;
use utoipa::ToSchema;

/// Health payload reported by the backend.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Number of sessions currently tracked in memory, live or ended.
    pub tracked_sessions: usize,
}

impl HealthResponse {
    /// Healthy response with the current session count.
    pub fn ok(tracked_sessions: usize) -> Self {
        Self {
            status: "ok",
            tracked_sessions,
        }
    }
}
