//! Board configuration management: the taxonomy behind the settings dialog.
//!
//! These routes are the administrative surface; the assistant's
//! CONFIGURATION_CHANGE proposals only record requests and never reach here.

use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, post},
    Json, Router,
};
use db::models::config_change::ConfigChangeRequest;
use serde::Deserialize;
use services::{BoardConfig, NamedColor};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize, TS)]
pub struct NamePayload {
    pub name: String,
}

pub async fn get_config(
    State(state): State<AppState>,
) -> ResponseJson<ApiResponse<BoardConfig>> {
    Json(ApiResponse::success(state.config.snapshot().await))
}

pub async fn list_change_requests(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<ConfigChangeRequest>>>, ApiError> {
    let requests = ConfigChangeRequest::list(&state.db.pool).await?;
    Ok(Json(ApiResponse::success(requests)))
}

pub async fn add_status(
    State(state): State<AppState>,
    Json(payload): Json<NamePayload>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.add_status(&payload.name))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn remove_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.remove_status(&name))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn add_priority(
    State(state): State<AppState>,
    Json(payload): Json<NamedColor>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.add_priority(payload))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn remove_priority(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.remove_priority(&name))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn add_product_area(
    State(state): State<AppState>,
    Json(payload): Json<NamePayload>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.add_product_area(&payload.name))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn remove_product_area(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.remove_product_area(&name))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn add_effort_size(
    State(state): State<AppState>,
    Json(payload): Json<NamePayload>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.add_effort_size(&payload.name))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn remove_effort_size(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.remove_effort_size(&name))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn add_team_member(
    State(state): State<AppState>,
    Json(payload): Json<NamedColor>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.add_team_member(payload))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn remove_team_member(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<ResponseJson<ApiResponse<BoardConfig>>, ApiError> {
    let config = state
        .config
        .mutate(|config| config.remove_team_member(&name))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(get_config))
        .route("/config/change-requests", get(list_change_requests))
        .route("/config/statuses", post(add_status))
        .route("/config/statuses/{name}", delete(remove_status))
        .route("/config/priorities", post(add_priority))
        .route("/config/priorities/{name}", delete(remove_priority))
        .route("/config/product-areas", post(add_product_area))
        .route("/config/product-areas/{name}", delete(remove_product_area))
        .route("/config/effort-sizes", post(add_effort_size))
        .route("/config/effort-sizes/{name}", delete(remove_effort_size))
        .route("/config/team-members", post(add_team_member))
        .route("/config/team-members/{name}", delete(remove_team_member))
}
