//! API Server binary entrypoint.

use api_server::{ApiServer, ServerConfig};
use game_core::GameConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (LOG_FORMAT=json for structured output)
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "api_server=debug,game_core=debug,tower_http=debug,axum=debug".into()
        }))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let config = ServerConfig::from_env();
    let game_config = GameConfig::from_env()?;

    let server = ApiServer::new(config, game_config)?;
    server.run().await?;

    Ok(())
}
