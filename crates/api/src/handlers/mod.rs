pub mod analytics;
pub mod auth;
pub mod chat;
pub mod feedback;
pub mod gamification;
pub mod predict;
pub mod tts;
pub mod users;
