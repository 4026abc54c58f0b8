use axum::routing::post;
use axum::Router;

use crate::handlers::{chat, tts};
use crate::state::AppState;

/// ```text
/// POST /chat  -> chat
/// POST /tts   -> generate_speech
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/tts", post(tts::generate_speech))
}
