use axum::{response::Json as ResponseJson, Json};
use utils::response::ApiResponse;

pub async fn health_check() -> ResponseJson<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}
