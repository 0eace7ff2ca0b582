use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use db::models::task::{CreateTask, Task, UpdateTask};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// Create payload as the board sends it. Status and priority fall back to the
/// configured defaults when absent.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub effort: Option<String>,
    pub product_area: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<Uuid>,
    pub reporter: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct AddDependency {
    pub depends_on_id: Uuid,
}

fn check_date_range(
    start: Option<NaiveDate>,
    due: Option<NaiveDate>,
) -> Result<(), ApiError> {
    if let (Some(start), Some(due)) = (start, due) {
        if due < start {
            return Err(ApiError::BadRequest(
                "Due date must not be earlier than start date".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn get_tasks(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_all(&state.db.pool).await?;
    Ok(Json(ApiResponse::success(tasks)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::find_by_id(&state.db.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {id} not found")))?;
    Ok(Json(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskPayload>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title must not be empty".to_string()));
    }
    check_date_range(payload.start_date, payload.due_date)?;

    let config = state.config.snapshot().await;
    let data = CreateTask {
        title: payload.title,
        description: payload.description,
        status: payload
            .status
            .unwrap_or_else(|| config.default_status().to_string()),
        priority: payload
            .priority
            .unwrap_or_else(|| config.default_priority().to_string()),
        assignees: payload.assignees,
        start_date: payload.start_date,
        due_date: payload.due_date,
        effort: payload.effort,
        product_area: payload.product_area,
        depends_on: payload.depends_on,
        reporter: payload.reporter,
        parent_id: payload.parent_id,
        tags: payload.tags,
    };

    tracing::debug!("Creating task '{}' in status '{}'", data.title, data.status);
    let task = Task::create(&state.db.pool, &data, Uuid::new_v4()).await?;
    Ok(Json(ApiResponse::success(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::find_by_id(&state.db.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {id} not found")))?;

    if let Some(new_deps) = &patch.depends_on {
        for dep in new_deps {
            if task.depends_on.0.contains(dep) {
                continue;
            }
            if Task::would_create_cycle(&state.db.pool, task.id, *dep).await? {
                return Err(ApiError::Conflict(
                    "Dependency would create a cycle".to_string(),
                ));
            }
        }
    }

    let merged = task.apply_patch(&patch);
    merged.validate()?;
    let updated = Task::update(&state.db.pool, &merged).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Task::delete(&state.db.pool, id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn add_dependency(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddDependency>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::add_dependency(&state.db.pool, id, payload.depends_on_id).await?;
    Ok(Json(ApiResponse::success(task)))
}

pub async fn remove_dependency(
    State(state): State<AppState>,
    Path((id, dependency_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::remove_dependency(&state.db.pool, id, dependency_id).await?;
    Ok(Json(ApiResponse::success(task)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(get_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/dependencies", post(add_dependency))
        .route(
            "/tasks/{id}/dependencies/{dependency_id}",
            delete(remove_dependency),
        )
}
