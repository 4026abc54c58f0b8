//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod feedback_repo;
pub mod score_repo;
pub mod user_repo;

pub use feedback_repo::FeedbackRepo;
pub use score_repo::{ScoreRepo, ScoreUpdateError};
pub use user_repo::UserRepo;
