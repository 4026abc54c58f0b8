use std::net::SocketAddr;
use std::sync::Arc;

use ecosort_clients::{ChatbotClient, HttpDetector, TtsClient};
use ecosort_core::classification::{ClassificationService, ClassificationSettings};
use ecosort_core::ffmpeg::FfmpegFrameSource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecosort_api::config::ServerConfig;
use ecosort_api::router::build_app_router;
use ecosort_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecosort_api=debug,ecosort_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = ecosort_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    ecosort_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    ecosort_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Static storage ---
    for dir in [config.uploads_dir(), config.audio_dir()] {
        tokio::fs::create_dir_all(&dir)
            .await
            .unwrap_or_else(|e| panic!("Failed to create {}: {e}", dir.display()));
    }

    // --- Classification ---
    let detector = Arc::new(HttpDetector::new(
        config.detector.url.clone(),
        config.detector.confidence_threshold,
        config.detector.iou_threshold,
    ));
    let classifier = Arc::new(ClassificationService::new(
        detector,
        Arc::new(FfmpegFrameSource::default()),
        ClassificationSettings {
            confidence_threshold: config.detector.confidence_threshold,
            max_video_frames: config.detector.max_video_frames,
        },
    ));
    tracing::info!(detector_url = %config.detector.url, "Classifier ready");

    // --- Assistant clients ---
    let chatbot = ChatbotClient::new(
        config.chatbot.api_url.clone(),
        config.chatbot.model.clone(),
        config.chatbot.api_key.clone(),
    );
    if !chatbot.is_configured() {
        tracing::warn!("GEMINI_API_KEY not set, chatbot will reply with a fallback message");
    }
    let tts = TtsClient::new(config.tts.api_url.clone(), config.tts.language.clone());

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        classifier,
        chatbot: Arc::new(chatbot),
        tts: Arc::new(tts),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
