//! Handlers for the `/auth` resource (signup, login, password reset).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ecosort_core::error::CoreError;
use ecosort_core::types::DbId;
use ecosort_db::models::user::CreateUser;
use ecosort_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_token, validate_token, TokenPurpose};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Returned by signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    /// Bearer access token.
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Register a new account and return an access token. The display name
/// becomes the username.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let input = SignupRequest {
        name: input.name.trim().to_string(),
        email: normalize_email(&input.email),
        password: input.password,
    };
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.name,
            email: input.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    let response = auth_response(&state, user.id, user.username, user.email)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Incorrect email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, &normalize_email(&input.email))
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Unauthorized(
            "User account is deactivated".into(),
        )));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    Ok(Json(auth_response(&state, user.id, user.username, user.email)?))
}

/// POST /api/v1/auth/forgot-password
///
/// Issue a password-reset token. There is no mail transport; delivery is
/// logged for the operator.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = normalize_email(&input.email);
    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No account registered for {email}")))?;

    let token = generate_token(user.id, &user.email, TokenPurpose::PasswordReset, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(
        user_id = user.id,
        email = %user.email,
        reset_token = %token,
        "Password reset token issued",
    );

    Ok(Json(MessageResponse::new(
        "Password reset instructions have been sent",
    )))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let claims = validate_token(&input.token, TokenPurpose::PasswordReset, &state.config.jwt)
        .map_err(|_| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired reset token".into(),
            ))
        })?;

    validate_password_strength(&input.new_password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password(&state.pool, claims.sub, &password_hash).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: claims.sub,
        }));
    }

    tracing::info!(user_id = claims.sub, "Password reset");
    Ok(Json(MessageResponse::new("Password has been reset")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn auth_response(
    state: &AppState,
    id: DbId,
    username: String,
    email: String,
) -> AppResult<AuthResponse> {
    let token = generate_token(id, &email, TokenPurpose::Access, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    Ok(AuthResponse {
        id,
        username,
        email,
        token,
    })
}
