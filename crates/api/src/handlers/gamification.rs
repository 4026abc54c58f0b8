//! Leaderboard and per-user score handlers.

use axum::extract::{Path, State};
use axum::Json;
use ecosort_core::error::CoreError;
use ecosort_core::leaderboard::{self, LeaderboardEntry, UserStats};
use ecosort_core::types::DbId;
use ecosort_db::models::score_record::ScoreRecord;
use ecosort_db::repositories::{ScoreRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::ListResponse;
use crate::state::AppState;

/// Body for `POST`/`PUT /leaderboard`. Values are added to the current totals.
#[derive(Debug, Deserialize)]
pub struct LeaderboardUpdateRequest {
    pub user_id: DbId,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub items_analyzed: i64,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub user_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub user_id: DbId,
    pub username: String,
    pub score: i64,
    pub items_analyzed: i64,
}

/// GET /api/v1/leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> AppResult<Json<ListResponse<LeaderboardEntry>>> {
    let standings = ScoreRepo::list_standings(&state.pool).await?;
    Ok(Json(ListResponse {
        entries: leaderboard::rank(standings),
    }))
}

/// POST|PUT /api/v1/leaderboard
pub async fn update_leaderboard(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<LeaderboardUpdateRequest>,
) -> AppResult<Json<ScoreResponse>> {
    auth.ensure_self(input.user_id)?;
    let username = username_of(&state, input.user_id).await?;

    let record =
        ScoreRepo::apply_delta(&state.pool, input.user_id, input.score, input.items_analyzed)
            .await?;
    tracing::info!(
        user_id = input.user_id,
        score_delta = input.score,
        items_delta = input.items_analyzed,
        score = record.score,
        "Leaderboard adjusted",
    );
    Ok(Json(score_response(record, username)))
}

/// POST /api/v1/leaderboard/analysis
pub async fn record_analysis(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<AnalysisRequest>,
) -> AppResult<Json<ScoreResponse>> {
    auth.ensure_self(input.user_id)?;
    let username = username_of(&state, input.user_id).await?;

    let record = ScoreRepo::record_analysis(&state.pool, input.user_id).await?;
    tracing::info!(
        user_id = input.user_id,
        score = record.score,
        items_analyzed = record.items_analyzed,
        "Analysis recorded",
    );
    Ok(Json(score_response(record, username)))
}

/// GET /api/v1/user/{user_id}/stats
///
/// Users without a score record are reported with zero totals and a rank
/// one past the last entry.
pub async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<UserStats>> {
    let standings = ScoreRepo::list_standings(&state.pool).await?;
    Ok(Json(leaderboard::stats_for(standings, user_id)))
}

async fn username_of(state: &AppState, user_id: DbId) -> AppResult<String> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .map(|u| u.username)
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))
}

fn score_response(record: ScoreRecord, username: String) -> ScoreResponse {
    ScoreResponse {
        user_id: record.user_id,
        username,
        score: record.score,
        items_analyzed: record.items_analyzed,
    }
}
