//! The conversational endpoint.
//!
//! Replies are always HTTP 200: upstream failures, malformed model output,
//! and unresolved task references all render as displayable conversation
//! text, not transport errors. The response body is the widget protocol
//! itself rather than the `ApiResponse` envelope the CRUD routes use.

use assistant::{ChatRequest, ChatResponse};
use axum::{
    extract::State,
    response::Json as ResponseJson,
    routing::post,
    Json, Router,
};

use crate::AppState;

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ResponseJson<ChatResponse> {
    let config = state.config.snapshot().await;
    let response = state.chat.handle(request, &config).await;
    Json(response)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}
