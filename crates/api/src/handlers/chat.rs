use axum::extract::State;
use axum::Json;
use ecosort_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub user_message: String,
    pub bot_reply: String,
}

/// POST /api/v1/chat
///
/// Always answers 200; upstream problems surface as a fallback reply.
pub async fn chat(
    State(state): State<AppState>,
    Json(input): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if input.message.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "message must not be empty".into(),
        )));
    }
    let bot_reply = state.chatbot.reply(&input.message).await;
    Ok(Json(ChatResponse {
        user_message: input.message,
        bot_reply,
    }))
}
