//! [`Detector`] implementation backed by an HTTP inference server.
//!
//! The server exposes `POST {api_url}/detect` accepting a multipart form with
//! the image under `file` plus `conf` and `iou` thresholds, and answers
//! `{"detections": [{"label", "confidence", "bbox": [x1, y1, x2, y2]}]}`.

use async_trait::async_trait;
use ecosort_core::detection::{Detection, Detector, ImagePayload, InferenceError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DetectResponse {
    detections: Vec<Detection>,
}

/// HTTP client for a single detection server.
pub struct HttpDetector {
    client: reqwest::Client,
    api_url: String,
    confidence_threshold: f64,
    iou_threshold: f64,
}

impl HttpDetector {
    /// * `api_url` - Base HTTP URL, e.g. `http://host:9000`.
    pub fn new(api_url: String, confidence_threshold: f64, iou_threshold: f64) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, confidence_threshold, iou_threshold)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_url: String,
        confidence_threshold: f64,
        iou_threshold: f64,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            confidence_threshold,
            iou_threshold,
        }
    }

    fn form(&self, image: &ImagePayload) -> Result<Form, InferenceError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.content_type)
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;
        Ok(Form::new()
            .part("file", part)
            .text("conf", self.confidence_threshold.to_string())
            .text("iou", self.iou_threshold.to_string()))
    }
}

fn parse_detections(body: &str) -> Result<Vec<Detection>, InferenceError> {
    serde_json::from_str::<DetectResponse>(body)
        .map(|r| r.detections)
        .map_err(|e| InferenceError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(&self, image: &ImagePayload) -> Result<Vec<Detection>, InferenceError> {
        let response = self
            .client
            .post(format!("{}/detect", self.api_url))
            .multipart(self.form(image)?)
            .send()
            .await
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            return Err(InferenceError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let detections = parse_detections(&body)?;
        tracing::debug!(
            file_name = %image.file_name,
            count = detections.len(),
            "Detection backend responded",
        );
        Ok(detections)
    }
}
