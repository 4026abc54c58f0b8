//! Gamification score rows.

use ecosort_core::leaderboard::Standing;
use ecosort_core::scoring::ScoreTotals;
use ecosort_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `score_records`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScoreRecord {
    pub user_id: DbId,
    pub score: i64,
    pub items_analyzed: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ScoreRecord {
    pub fn totals(&self) -> ScoreTotals {
        ScoreTotals {
            score: self.score,
            items_analyzed: self.items_analyzed,
        }
    }
}

/// A score record joined with the owner's username.
#[derive(Debug, Clone, FromRow)]
pub struct StandingRow {
    pub user_id: DbId,
    pub username: String,
    pub score: i64,
    pub items_analyzed: i64,
}

impl From<StandingRow> for Standing {
    fn from(row: StandingRow) -> Self {
        Standing {
            user_id: row.user_id,
            username: row.username,
            score: row.score,
            items_analyzed: row.items_analyzed,
        }
    }
}
