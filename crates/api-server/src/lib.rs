//! API Server
//!
//! HTTP surface for the sealed-number trading game.
//!
//! # Routes
//!
//! - `POST /start_game`: deal a new game and open trading
//! - `GET /game_state`: market snapshot
//! - `POST /trade`: match a trade between two players
//! - `POST /end_game`: close trading and settle
//!
//! # Example
//!
//! ```ignore
//! use api_server::{ApiServer, ServerConfig};
//! use game_core::GameConfig;
//!
//! let server = ApiServer::new(ServerConfig::from_env(), GameConfig::from_env()?)?;
//! server.run().await?;
//! ```

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use game_core::GameConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable CORS for all origins (development only).
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("API_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            cors_permissive: std::env::var("CORS_PERMISSIVE")
                .map(|v| v == "true")
                .unwrap_or(true),
        }
    }

    /// Get the socket address, falling back to all interfaces if the host
    /// does not parse.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| {
                warn!(host = %self.host, "Invalid API_HOST, binding to 0.0.0.0");
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
            })
    }
}

/// The API server.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new API server holding a dealt, not yet started game.
    pub fn new(config: ServerConfig, game_config: GameConfig) -> anyhow::Result<Self> {
        let state = AppState::new(game_config)?;
        Ok(Self { config, state })
    }

    /// Build the router with middleware applied.
    pub fn router(&self) -> axum::Router {
        let state = Arc::new(self.state.clone());

        create_router(state)
            .layer(
                TraceLayer::new_for_http()
                    .on_request(|request: &Request<_>, _span: &tracing::Span| {
                        tracing::info!(
                            method = %request.method(),
                            uri = %request.uri(),
                            "Incoming request"
                        );
                    })
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG))
                    .on_failure(
                        |error: tower_http::classify::ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                error = %error,
                                latency_ms = latency.as_millis(),
                                "Request failed"
                            );
                        },
                    ),
            )
            .layer(DefaultBodyLimit::max(64 * 1024))
            .layer(if self.config.cors_permissive {
                CorsLayer::permissive()
            } else {
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            })
    }

    /// Run the server.
    pub async fn run(self) -> anyhow::Result<()> {
        let router = self.router();

        let addr = self.config.socket_addr();
        info!(
            address = %addr,
            num_players = self.state.game_config.num_players,
            number_range = self.state.game_config.number_range,
            "Starting API server"
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
