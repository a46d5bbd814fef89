use serde::Serialize;
use utoipa::ToSchema;

/// Minimal acknowledgement body for operations with nothing else to report.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human readable outcome.
    pub message: String,
}

impl ActionResponse {
    /// Build an acknowledgement with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
