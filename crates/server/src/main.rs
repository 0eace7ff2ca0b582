use std::sync::Arc;

use anyhow::Error as AnyhowError;
use assistant::{CompletionClient, LlmConfig};
use db::DBService;
use server::{routes, AppState};
use services::{ConfigError, ConfigService};
use sqlx::Error as SqlxError;
use thiserror::Error;
use tracing_subscriber::{prelude::*, EnvFilter};
use utils::assets::{asset_dir, config_path};

#[derive(Debug, Error)]
pub enum TaskdeckError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), TaskdeckError> {
    // Load environment variables from `.env` if present so local development
    // picks up API keys
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},assistant={level},db={level},services={level},utils={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string).expect("Failed to create tracing filter");
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    if !asset_dir().exists() {
        std::fs::create_dir_all(asset_dir())?;
    }

    let db = DBService::new().await?;
    let config = ConfigService::load(config_path())?;

    let llm_config = LlmConfig::from_env();
    tracing::info!(
        "Completion provider: {} (model {})",
        llm_config.provider,
        llm_config.model
    );
    let client = Arc::new(CompletionClient::new(llm_config));
    if !client.is_configured() {
        tracing::warn!("Completion client is not configured; chat requests will be apologized for");
    }

    let state = AppState::new(db, config, client);
    let app = routes::router(state);

    let port = std::env::var("TASKDECK_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3001);
    let host = std::env::var("TASKDECK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Taskdeck server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
