/// Registration, login, and logout of administrators.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Game definition CRUD and ownership checks.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Player-facing join/question/answer/results operations.
pub mod player_service;
/// Admin-driven session lifecycle, status, and results.
pub mod session_service;
/// Bearer token issue/verify capability.
pub mod token_service;
