use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::AppState;

pub mod chat;
pub mod config;
pub mod health;
pub mod tasks;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(chat::router())
        .merge(tasks::router())
        .merge(config::router())
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
