//! Leaderboard, analysis points and user stats over HTTP.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, post_json_auth, put_json_auth, token_for};
use ecosort_db::models::user::CreateUser;
use ecosort_db::repositories::UserRepo;
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Insert a user and return `(id, access token)`.
async fn create_user(pool: &PgPool, name: &str) -> (i64, String) {
    let email = format!("{name}@example.com");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: name.to_string(),
            email: email.clone(),
            password_hash: "unused".to_string(),
        },
    )
    .await
    .expect("user creation should succeed");
    (user.id, token_for(user.id, &email))
}

async fn analyse(pool: &PgPool, user_id: i64, token: &str) -> serde_json::Value {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/leaderboard/analysis",
        json!({ "user_id": user_id }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn adjust(pool: &PgPool, user_id: i64, token: &str, score: i64, items: i64) -> serde_json::Value {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/leaderboard",
        json!({ "user_id": user_id, "score": score, "items_analyzed": items }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn stats(pool: &PgPool, user_id: i64) -> serde_json::Value {
    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/user/{user_id}/stats"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Analysis points
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn five_analyses_then_a_sixth(pool: PgPool) {
    let (id, token) = create_user(&pool, "ada").await;

    let mut last = json!(null);
    for _ in 0..5 {
        last = analyse(&pool, id, &token).await;
    }
    assert_eq!(last["score"], 750);
    assert_eq!(last["items_analyzed"], 5);
    assert_eq!(last["username"], "ada");

    let sixth = analyse(&pool, id, &token).await;
    assert_eq!(sixth["score"], 1000);
    assert_eq!(sixth["items_analyzed"], 6);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn analysis_for_someone_else_is_forbidden(pool: PgPool) {
    let (_alice, alice_token) = create_user(&pool, "alice").await;
    let (bob, _) = create_user(&pool, "bob").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/leaderboard/analysis",
        json!({ "user_id": bob }),
        &alice_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/leaderboard/analysis",
        json!({ "user_id": bob }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn token_for_deleted_user_is_404(pool: PgPool) {
    let (id, token) = create_user(&pool, "gone").await;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/leaderboard/analysis",
        json!({ "user_id": id }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Explicit adjustments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn deltas_accumulate_and_zero_is_a_no_op(pool: PgPool) {
    let (id, token) = create_user(&pool, "grace").await;

    let first = adjust(&pool, id, &token, 100, 2).await;
    assert_eq!(first["score"], 100);
    assert_eq!(first["items_analyzed"], 2);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/leaderboard",
        json!({ "user_id": id, "score": 40, "items_analyzed": 1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_eq!(second["score"], 140);
    assert_eq!(second["items_analyzed"], 3);

    let (updated_before,): (chrono::DateTime<chrono::Utc>,) =
        sqlx::query_as("SELECT updated_at FROM score_records WHERE user_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();

    let unchanged = adjust(&pool, id, &token, 0, 0).await;
    assert_eq!(unchanged["score"], 140);
    assert_eq!(unchanged["items_analyzed"], 3);

    let (updated_after,): (chrono::DateTime<chrono::Utc>,) =
        sqlx::query_as("SELECT updated_at FROM score_records WHERE user_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(updated_before, updated_after);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn overflowing_adjustment_is_rejected_and_row_kept(pool: PgPool) {
    let (id, token) = create_user(&pool, "knuth").await;

    let huge: i64 = 9_223_372_036_854_775_000;
    let first = adjust(&pool, id, &token, huge, 1).await;
    assert_eq!(first["score"], huge);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/leaderboard",
        json!({ "user_id": id, "score": huge, "items_analyzed": 1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (score, items): (i64, i64) =
        sqlx::query_as("SELECT score, items_analyzed FROM score_records WHERE user_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!((score, items), (huge, 1));

    // The record still accepts adjustments that fit.
    let lowered = adjust(&pool, id, &token, -huge, 0).await;
    assert_eq!(lowered["score"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn omitted_fields_default_to_zero(pool: PgPool) {
    let (id, token) = create_user(&pool, "hopper").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/leaderboard",
        json!({ "user_id": id, "score": 25 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["score"], 25);
    assert_eq!(json["items_analyzed"], 0);
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn leaderboard_ranks_by_score(pool: PgPool) {
    let (a, a_token) = create_user(&pool, "alice").await;
    let (b, b_token) = create_user(&pool, "bob").await;
    let (c, c_token) = create_user(&pool, "carol").await;
    adjust(&pool, a, &a_token, 50, 1).await;
    adjust(&pool, b, &b_token, 200, 4).await;
    adjust(&pool, c, &c_token, 75, 2).await;

    let response = get(common::build_test_app(pool.clone()), "/api/v1/leaderboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let entries = json["entries"].as_array().unwrap();

    let scores: Vec<_> = entries.iter().map(|e| e["score"].as_i64().unwrap()).collect();
    let ranks: Vec<_> = entries.iter().map(|e| e["rank"].as_i64().unwrap()).collect();
    assert_eq!(scores, [200, 75, 50]);
    assert_eq!(ranks, [1, 2, 3]);
    assert_eq!(entries[0]["username"], "bob");

    let alice = stats(&pool, a).await;
    assert_eq!(alice["rank"], 3);
    assert_eq!(alice["score"], 50);
    assert_eq!(alice["items_analyzed"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn equal_scores_rank_lower_id_first(pool: PgPool) {
    let (first, first_token) = create_user(&pool, "first").await;
    let (second, second_token) = create_user(&pool, "second").await;
    // Insert the later user's record first so row order differs from id order.
    adjust(&pool, second, &second_token, 100, 1).await;
    adjust(&pool, first, &first_token, 100, 1).await;

    assert_eq!(stats(&pool, first).await["rank"], 1);
    assert_eq!(stats(&pool, second).await["rank"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn user_without_record_ranks_after_everyone(pool: PgPool) {
    let (a, a_token) = create_user(&pool, "scored").await;
    let (idle, _) = create_user(&pool, "idle").await;
    adjust(&pool, a, &a_token, 10, 1).await;

    let json = stats(&pool, idle).await;
    assert_eq!(json["user_id"], idle);
    assert_eq!(json["score"], 0);
    assert_eq!(json["items_analyzed"], 0);
    assert_eq!(json["rank"], 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_leaderboard(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/leaderboard").await;
    let json = body_json(response).await;
    assert_eq!(json["entries"], json!([]));
}
