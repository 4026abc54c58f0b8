//! JWT generation and validation.
//!
//! Tokens are HS256-signed JWTs carrying a [`Claims`] payload. The `purpose`
//! claim separates session tokens from password-reset tokens so neither can
//! stand in for the other.

use ecosort_core::types::DbId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    PasswordReset,
}

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub email: String,
    pub purpose: TokenPurpose,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub reset_token_expiry_mins: i64,
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;
const DEFAULT_RESET_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `60`    |
    /// | `JWT_RESET_EXPIRY_MINS`  | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let reset_token_expiry_mins: i64 = std::env::var("JWT_RESET_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_RESET_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_RESET_EXPIRY_MINS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            reset_token_expiry_mins,
        }
    }

    fn expiry_mins(&self, purpose: TokenPurpose) -> i64 {
        match purpose {
            TokenPurpose::Access => self.access_token_expiry_mins,
            TokenPurpose::PasswordReset => self.reset_token_expiry_mins,
        }
    }
}

/// Generate an HS256 token for the given user and purpose.
pub fn generate_token(
    user_id: DbId,
    email: &str,
    purpose: TokenPurpose,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        purpose,
        exp: now + config.expiry_mins(purpose) * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate a token and check it was issued for `expected` purpose.
///
/// Signature and expiration are checked by `jsonwebtoken`; a purpose
/// mismatch is reported as [`ErrorKind::InvalidToken`].
pub fn validate_token(
    token: &str,
    expected: TokenPurpose,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    if token_data.claims.purpose != expected {
        return Err(ErrorKind::InvalidToken.into());
    }
    Ok(token_data.claims)
}
