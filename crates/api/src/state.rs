use std::sync::Arc;

use ecosort_clients::{ChatbotClient, TtsClient};
use ecosort_core::classification::ClassificationService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: ecosort_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Image/video classifier wired to the configured detector and decoder.
    pub classifier: Arc<ClassificationService>,
    pub chatbot: Arc<ChatbotClient>,
    pub tts: Arc<TtsClient>,
}
