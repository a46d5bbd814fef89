use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the BigBrain backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::admin::list_games,
        crate::routes::admin::put_games,
        crate::routes::admin::mutate_game,
        crate::routes::admin::session_status,
        crate::routes::admin::session_results,
        crate::routes::play::join,
        crate::routes::play::status,
        crate::routes::play::question,
        crate::routes::play::revealed_answers,
        crate::routes::play::submit_answers,
        crate::routes::play::results,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::auth::RegisterRequest,
            crate::dto::auth::LoginRequest,
            crate::dto::auth::TokenResponse,
            crate::dto::common::ActionResponse,
            crate::dto::admin::GameInput,
            crate::dto::admin::PutGamesRequest,
            crate::dto::admin::GameSummary,
            crate::dto::admin::GamesResponse,
            crate::dto::admin::MutateRequest,
            crate::dto::admin::MutationOutcome,
            crate::dto::admin::SessionStatusResponse,
            crate::dto::admin::SessionResultsResponse,
            crate::dto::play::JoinRequest,
            crate::dto::play::JoinResponse,
            crate::dto::play::PlayerStatusResponse,
            crate::dto::play::PlayerQuestionResponse,
            crate::dto::play::PublicQuestion,
            crate::dto::play::RevealedAnswersResponse,
            crate::dto::play::SubmitAnswersRequest,
            crate::dto::play::AnswerRecordDto,
            crate::dao::models::QuestionEntity,
            crate::state::state_machine::MutationKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Administrator registration and login"),
        (name = "admin", description = "Game management and session control"),
        (name = "play", description = "Player-facing session operations"),
    )
)]
pub struct ApiDoc;
