//! Prediction feedback model and DTOs.

use ecosort_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Feedback {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub predicted_label: String,
    /// `None` when the user confirmed the prediction without correcting it.
    pub correct_label: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateFeedback {
    pub user_id: Option<DbId>,
    pub predicted_label: String,
    pub correct_label: Option<String>,
}
