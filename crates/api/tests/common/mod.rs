#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use ecosort_api::auth::jwt::{generate_token, JwtConfig, TokenPurpose};
use ecosort_api::config::{ChatbotConfig, DetectorConfig, ServerConfig, TtsConfig};
use ecosort_api::router::build_app_router;
use ecosort_api::state::AppState;
use ecosort_clients::{ChatbotClient, TtsClient};
use ecosort_core::classification::{ClassificationService, ClassificationSettings};
use ecosort_core::detection::{Detection, Detector, ImagePayload, InferenceError};
use ecosort_core::frames::{Frame, FrameSource, FrameStream, MediaError};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// An address nothing listens on; outbound calls fail fast.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Detector returning the same detections for every image.
pub struct FixedDetector(pub Vec<Detection>);

#[async_trait]
impl Detector for FixedDetector {
    async fn detect(&self, _image: &ImagePayload) -> Result<Vec<Detection>, InferenceError> {
        Ok(self.0.clone())
    }
}

/// Detector that always fails as if the backend were down.
pub struct DownDetector;

#[async_trait]
impl Detector for DownDetector {
    async fn detect(&self, _image: &ImagePayload) -> Result<Vec<Detection>, InferenceError> {
        Err(InferenceError::Unavailable("connection refused".into()))
    }
}

/// Frame source yielding `total` blank frames regardless of file contents.
pub struct BlankFrames {
    pub total: u64,
}

struct BlankStream {
    next: u64,
    total: u64,
    stride: u64,
}

#[async_trait]
impl FrameSource for BlankFrames {
    async fn open(&self, path: &Path, stride: u32) -> Result<Box<dyn FrameStream>, MediaError> {
        if !path.exists() {
            return Err(MediaError::NotFound(path.display().to_string()));
        }
        Ok(Box::new(BlankStream {
            next: 0,
            total: self.total,
            stride: u64::from(stride),
        }))
    }
}

#[async_trait]
impl FrameStream for BlankStream {
    async fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        if self.next >= self.total {
            return Ok(None);
        }
        let index = self.next;
        self.next += self.stride;
        Ok(Some(Frame {
            index,
            image: image::RgbImage::new(4, 4),
        }))
    }
}

pub fn detection(label: &str, confidence: f64) -> Detection {
    Detection {
        label: label.to_string(),
        confidence,
        bbox: [10.0, 20.0, 110.0, 220.0],
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults and a fresh static dir.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        static_dir: fresh_static_dir(),
        max_upload_bytes: 1024 * 1024,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
            reset_token_expiry_mins: 15,
        },
        detector: DetectorConfig {
            url: UNREACHABLE.to_string(),
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
            default_frame_interval: 30,
            max_video_frames: 300,
        },
        chatbot: ChatbotConfig {
            api_key: String::new(),
            model: "gemini-1.5-pro".to_string(),
            api_url: UNREACHABLE.to_string(),
        },
        tts: TtsConfig {
            api_url: UNREACHABLE.to_string(),
            language: "en".to_string(),
        },
    }
}

fn fresh_static_dir() -> PathBuf {
    std::env::temp_dir().join(format!("ecosort-test-{}", uuid::Uuid::new_v4().simple()))
}

/// App whose detector finds a plastic bottle and a glass jar in every image,
/// and whose videos have 90 frames.
pub fn build_test_app(pool: PgPool) -> Router {
    let detector = FixedDetector(vec![detection("glass", 0.62), detection("plastic", 0.91)]);
    build_test_app_with(pool, Arc::new(detector), test_config())
}

pub fn build_test_app_with(pool: PgPool, detector: Arc<dyn Detector>, config: ServerConfig) -> Router {
    let classifier = ClassificationService::new(
        detector,
        Arc::new(BlankFrames { total: 90 }),
        ClassificationSettings {
            confidence_threshold: config.detector.confidence_threshold,
            max_video_frames: config.detector.max_video_frames,
        },
    );
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        classifier: Arc::new(classifier),
        chatbot: Arc::new(ChatbotClient::new(
            config.chatbot.api_url.clone(),
            config.chatbot.model.clone(),
            config.chatbot.api_key.clone(),
        )),
        tts: Arc::new(TtsClient::new(
            config.tts.api_url.clone(),
            config.tts.language.clone(),
        )),
    };
    build_app_router(state, &config)
}

/// Access token for `user_id`, signed with the test secret.
pub fn token_for(user_id: i64, email: &str) -> String {
    generate_token(user_id, email, TokenPurpose::Access, &test_config().jwt)
        .expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body, None)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body, Some(token))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, body, Some(token))).await
}

/// POST a single-file multipart form with the file under `field`.
pub async fn post_file(
    app: Router,
    uri: &str,
    field: &str,
    file_name: &str,
    bytes: &[u8],
) -> Response<Body> {
    const BOUNDARY: &str = "ecosort-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}
