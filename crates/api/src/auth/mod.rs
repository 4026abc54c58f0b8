//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT generation and validation for access and password-reset tokens.

pub mod jwt;
pub mod password;
