//! Handlers for prediction feedback.

use axum::extract::State;
use axum::Json;
use ecosort_core::error::CoreError;
use ecosort_core::types::DbId;
use ecosort_db::models::feedback::{CreateFeedback, Feedback};
use ecosort_db::repositories::FeedbackRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::ListResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub predicted_label: String,
    /// Absent or blank when the prediction was right.
    pub correct_label: Option<String>,
    pub user_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
    pub predicted: String,
    pub correct: Option<String>,
    pub user_id: Option<DbId>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            status: "success",
            predicted: f.predicted_label,
            correct: f.correct_label,
            user_id: f.user_id,
        }
    }
}

/// POST /api/v1/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(input): Json<FeedbackRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    let predicted_label = input.predicted_label.trim().to_string();
    if predicted_label.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "predicted_label must not be empty".into(),
        )));
    }
    let correct_label = input
        .correct_label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    let feedback = FeedbackRepo::create(
        &state.pool,
        &CreateFeedback {
            user_id: input.user_id,
            predicted_label,
            correct_label,
        },
    )
    .await?;

    tracing::info!(
        feedback_id = feedback.id,
        predicted = %feedback.predicted_label,
        correct = ?feedback.correct_label,
        "Feedback recorded",
    );
    Ok(Json(feedback.into()))
}

/// GET /api/v1/feedback
pub async fn list_feedback(
    State(state): State<AppState>,
) -> AppResult<Json<ListResponse<FeedbackResponse>>> {
    let entries = FeedbackRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(FeedbackResponse::from)
        .collect();
    Ok(Json(ListResponse { entries }))
}
