use std::path::PathBuf;
use std::str::FromStr;

use ecosort_core::classification::{DEFAULT_FRAME_INTERVAL, DEFAULT_MAX_VIDEO_FRAMES};
use ecosort_core::detection::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`). Video analysis
    /// runs inside the request, so this bounds it too.
    pub request_timeout_secs: u64,
    /// Root of the publicly served `/static` tree.
    pub static_dir: PathBuf,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    pub jwt: JwtConfig,
    pub detector: DetectorConfig,
    pub chatbot: ChatbotConfig,
    pub tts: TtsConfig,
}

/// Detection backend and sampling settings.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub url: String,
    pub confidence_threshold: f64,
    pub iou_threshold: f64,
    /// Stride used when `/predict` is called without `frame_interval`.
    pub default_frame_interval: u32,
    pub max_video_frames: u32,
}

#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    /// Empty disables upstream calls.
    pub api_key: String,
    pub model: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub api_url: String,
    pub language: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                                              |
    /// |---------------------------------|------------------------------------------------------|
    /// | `HOST`                          | `0.0.0.0`                                            |
    /// | `PORT`                          | `8000`                                               |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173`                              |
    /// | `REQUEST_TIMEOUT_SECS`          | `120`                                                |
    /// | `STATIC_DIR`                    | `static`                                             |
    /// | `MAX_UPLOAD_BYTES`              | `104857600`                                          |
    /// | `DETECTOR_URL`                  | `http://localhost:9000`                              |
    /// | `DETECTOR_CONFIDENCE_THRESHOLD` | `0.5`                                                |
    /// | `DETECTOR_IOU_THRESHOLD`        | `0.45`                                               |
    /// | `DEFAULT_FRAME_INTERVAL`        | `30`                                                 |
    /// | `MAX_VIDEO_FRAMES`              | `300`                                                |
    /// | `GEMINI_API_KEY`                | empty                                                |
    /// | `GEMINI_MODEL`                  | `gemini-1.5-pro`                                     |
    /// | `GEMINI_API_URL`                | `https://generativelanguage.googleapis.com/v1beta`   |
    /// | `TTS_API_URL`                   | `https://translate.google.com/translate_tts`         |
    /// | `TTS_LANGUAGE`                  | `en`                                                 |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparsable values or a zero `DEFAULT_FRAME_INTERVAL`.
    pub fn from_env() -> Self {
        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let detector = DetectorConfig {
            url: env_or("DETECTOR_URL", "http://localhost:9000".to_string()),
            confidence_threshold: env_or(
                "DETECTOR_CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            ),
            iou_threshold: env_or("DETECTOR_IOU_THRESHOLD", DEFAULT_IOU_THRESHOLD),
            default_frame_interval: env_or("DEFAULT_FRAME_INTERVAL", DEFAULT_FRAME_INTERVAL),
            max_video_frames: env_or("MAX_VIDEO_FRAMES", DEFAULT_MAX_VIDEO_FRAMES),
        };
        assert!(
            detector.default_frame_interval >= 1,
            "DEFAULT_FRAME_INTERVAL must be at least 1"
        );

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 8000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 120),
            static_dir: PathBuf::from(env_or("STATIC_DIR", "static".to_string())),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 100 * 1024 * 1024),
            jwt: JwtConfig::from_env(),
            detector,
            chatbot: ChatbotConfig {
                api_key: env_or("GEMINI_API_KEY", String::new()),
                model: env_or("GEMINI_MODEL", "gemini-1.5-pro".to_string()),
                api_url: env_or(
                    "GEMINI_API_URL",
                    "https://generativelanguage.googleapis.com/v1beta".to_string(),
                ),
            },
            tts: TtsConfig {
                api_url: env_or(
                    "TTS_API_URL",
                    "https://translate.google.com/translate_tts".to_string(),
                ),
                language: env_or("TTS_LANGUAGE", "en".to_string()),
            },
        }
    }

    /// Directory holding stored uploads.
    pub fn uploads_dir(&self) -> PathBuf {
        self.static_dir.join("uploads")
    }

    /// Directory holding generated speech files.
    pub fn audio_dir(&self) -> PathBuf {
        self.static_dir.join("audio")
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
