pub mod assistant;
pub mod auth;
pub mod feedback;
pub mod gamification;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{predict, users};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/signup, /auth/login                        public
/// /auth/forgot-password, /auth/reset-password      public
/// /users/me                                        current user (auth)
///
/// /predict                                         classify an upload (POST, multipart)
///
/// /leaderboard                                     ranked scores; POST|PUT adjust (auth)
/// /leaderboard/analysis                            award analysis points (auth)
/// /user/{user_id}/stats                            one user's rank
///
/// /feedback                                        submit, list
/// /analytics                                       feedback-derived statistics
///
/// /chat                                            recycling assistant
/// /tts                                             text to speech
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .route("/users/me", get(users::me))
        .route("/predict", post(predict::predict))
        .merge(gamification::router())
        .merge(feedback::router())
        .merge(assistant::router())
}
