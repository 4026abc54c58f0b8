//! Repository for the `score_records` table.
//!
//! Every mutation runs in a transaction that creates the user's row on
//! first use and then holds it with `FOR UPDATE`, so concurrent analyses
//! for the same user serialise instead of losing increments. An update the
//! scoring rules reject leaves the row untouched.

use ecosort_core::error::CoreError;
use ecosort_core::leaderboard::Standing;
use ecosort_core::scoring::{self, ScoreTotals};
use ecosort_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::score_record::{ScoreRecord, StandingRow};

const COLUMNS: &str = "user_id, score, items_analyzed, created_at, updated_at";

/// Failure of a score mutation.
#[derive(Debug, thiserror::Error)]
pub enum ScoreUpdateError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// The scoring rules refused the new totals; nothing was written.
    #[error(transparent)]
    Rejected(#[from] CoreError),
}

pub struct ScoreRepo;

impl ScoreRepo {
    /// Fetch a user's score record, if one exists.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<ScoreRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM score_records WHERE user_id = $1");
        sqlx::query_as::<_, ScoreRecord>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Award points for one completed analysis.
    pub async fn record_analysis(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<ScoreRecord, ScoreUpdateError> {
        Self::mutate(pool, user_id, scoring::apply_analysis).await
    }

    /// Add `score_delta` and `items_delta` to a user's totals.
    ///
    /// A zero adjustment still creates the row if missing but never touches
    /// an existing one.
    pub async fn apply_delta(
        pool: &PgPool,
        user_id: DbId,
        score_delta: i64,
        items_delta: i64,
    ) -> Result<ScoreRecord, ScoreUpdateError> {
        Self::mutate(pool, user_id, |current| {
            scoring::apply_delta(current, score_delta, items_delta)
        })
        .await
    }

    /// Every score record joined with its username, in no particular order.
    pub async fn list_standings(pool: &PgPool) -> Result<Vec<Standing>, sqlx::Error> {
        let rows = sqlx::query_as::<_, StandingRow>(
            "SELECT s.user_id, u.username, s.score, s.items_analyzed
             FROM score_records s
             JOIN users u ON u.id = s.user_id",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Standing::from).collect())
    }

    async fn mutate<F>(
        pool: &PgPool,
        user_id: DbId,
        update: F,
    ) -> Result<ScoreRecord, ScoreUpdateError>
    where
        F: FnOnce(ScoreTotals) -> Result<ScoreTotals, CoreError>,
    {
        let mut tx = pool.begin().await?;

        let current = Self::lock_or_create(&mut tx, user_id).await?;
        let next = match update(current.totals()) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(user_id, error = %err, "Score update rejected");
                tx.rollback().await?;
                return Err(err.into());
            }
        };

        let record = if next == current.totals() {
            current
        } else {
            let query = format!(
                "UPDATE score_records SET score = $2, items_analyzed = $3
                 WHERE user_id = $1
                 RETURNING {COLUMNS}"
            );
            sqlx::query_as::<_, ScoreRecord>(&query)
                .bind(user_id)
                .bind(next.score)
                .bind(next.items_analyzed)
                .fetch_one(&mut *tx)
                .await?
        };

        tx.commit().await?;
        Ok(record)
    }

    async fn lock_or_create(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
    ) -> Result<ScoreRecord, sqlx::Error> {
        sqlx::query("INSERT INTO score_records (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        let query = format!("SELECT {COLUMNS} FROM score_records WHERE user_id = $1 FOR UPDATE");
        sqlx::query_as::<_, ScoreRecord>(&query)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
    }
}
