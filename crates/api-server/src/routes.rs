//! API route definitions.

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{game, health};
use crate::state::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sealed Number Trading Game API",
        version = "1.0.0",
        description = "Start a game, trade contracts between players, and settle against the sum of sealed numbers"
    ),
    paths(
        health::health_check,
        game::start_game,
        game::game_state,
        game::trade,
        game::end_game,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            health::HealthResponse,
            game::MessageResponse,
            game::TradeRequest,
            game::TradeResponse,
            game::PositionResponse,
            game::PlayerStateResponse,
            game::GameStateResponse,
            game::PlayerSettlementResponse,
            game::SettlementResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Game lifecycle and trading"),
    )
)]
pub struct ApiDoc;

/// Create the main router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))

        // Game endpoints
        .route("/start_game", post(game::start_game))
        .route("/game_state", get(game::game_state))
        .route("/trade", post(game::trade))
        .route("/end_game", post(game::end_game))

        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))

        // Add state
        .with_state(state)
}
