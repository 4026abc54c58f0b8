use axum::routing::{get, post};
use axum::Router;

use crate::handlers::gamification;
use crate::state::AppState;

/// ```text
/// GET      /leaderboard            -> get_leaderboard
/// POST|PUT /leaderboard            -> update_leaderboard (auth, own user)
/// POST     /leaderboard/analysis   -> record_analysis (auth, own user)
/// GET      /user/{user_id}/stats   -> user_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/leaderboard",
            get(gamification::get_leaderboard)
                .post(gamification::update_leaderboard)
                .put(gamification::update_leaderboard),
        )
        .route("/leaderboard/analysis", post(gamification::record_analysis))
        .route("/user/{user_id}/stats", get(gamification::user_stats))
}
