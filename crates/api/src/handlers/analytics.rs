use axum::extract::State;
use axum::Json;
use ecosort_core::analytics::{summarize, AnalyticsSummary};
use ecosort_db::repositories::FeedbackRepo;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/analytics
///
/// Prediction statistics derived from stored feedback.
pub async fn get_analytics(State(state): State<AppState>) -> AppResult<Json<AnalyticsSummary>> {
    let feedback = FeedbackRepo::list(&state.pool).await?;
    let summary = summarize(
        feedback
            .iter()
            .map(|f| (f.predicted_label.as_str(), f.correct_label.as_deref())),
    );
    Ok(Json(summary))
}
