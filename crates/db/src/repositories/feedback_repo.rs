//! Repository for the `feedback` table.

use sqlx::PgPool;

use crate::models::feedback::{CreateFeedback, Feedback};

const COLUMNS: &str = "id, user_id, predicted_label, correct_label, created_at";

pub struct FeedbackRepo;

impl FeedbackRepo {
    pub async fn create(pool: &PgPool, input: &CreateFeedback) -> Result<Feedback, sqlx::Error> {
        let query = format!(
            "INSERT INTO feedback (user_id, predicted_label, correct_label)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(input.user_id)
            .bind(&input.predicted_label)
            .bind(&input.correct_label)
            .fetch_one(pool)
            .await
    }

    /// All feedback, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Feedback>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM feedback ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Feedback>(&query).fetch_all(pool).await
    }
}
