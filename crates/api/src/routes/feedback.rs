use axum::routing::get;
use axum::Router;

use crate::handlers::{analytics, feedback};
use crate::state::AppState;

/// ```text
/// POST /feedback   -> submit_feedback
/// GET  /feedback   -> list_feedback
/// GET  /analytics  -> get_analytics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/feedback",
            get(feedback::list_feedback).post(feedback::submit_feedback),
        )
        .route("/analytics", get(analytics::get_analytics))
}
