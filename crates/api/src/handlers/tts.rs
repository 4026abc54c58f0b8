use axum::extract::State;
use axum::Json;
use ecosort_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TtsResponse {
    pub text: String,
    /// Public path of the generated MP3.
    pub audio_url: String,
}

/// POST /api/v1/tts
pub async fn generate_speech(
    State(state): State<AppState>,
    Json(input): Json<TtsRequest>,
) -> AppResult<Json<TtsResponse>> {
    if input.text.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "text must not be empty".into(),
        )));
    }

    let audio = state
        .tts
        .synthesize(&input.text)
        .await
        .map_err(|e| AppError::InternalError(format!("TTS generation failed: {e}")))?;

    let audio_dir = state.config.audio_dir();
    tokio::fs::create_dir_all(&audio_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create audio dir: {e}")))?;
    let file_name = format!("{}.mp3", uuid::Uuid::new_v4().simple());
    let path = audio_dir.join(&file_name);
    tokio::fs::write(&path, &audio)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write audio: {e}")))?;

    tracing::info!(path = %path.display(), bytes = audio.len(), "TTS generated");

    Ok(Json(TtsResponse {
        text: input.text,
        audio_url: format!("/static/audio/{file_name}"),
    }))
}
