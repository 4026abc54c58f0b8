//! Detection types and the single-image classifier.
//!
//! A [`Detector`] is the opaque inference backend: it turns one encoded
//! image into zero or more [`Detection`]s. [`FrameClassifier`] wraps a
//! detector and reduces its output to a [`ClassificationResult`], applying
//! the confidence threshold and an explicit confidence-descending sort so the
//! winning label never depends on the backend's output order.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Label reported when nothing was detected above the confidence threshold.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Default minimum confidence for a detection to count.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Default IoU threshold forwarded to the backend for non-max suppression.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.45;

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Waste category (e.g. `"plastic"`).
    pub label: String,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
    /// Bounding box as `[x1, y1, x2, y2]` in source-image pixels.
    pub bbox: [f64; 4],
}

/// Verdict for a single image or frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: f64,
    /// All detections above the threshold, highest confidence first.
    pub detections: Vec<Detection>,
}

impl ClassificationResult {
    /// The sentinel result for an input with no usable detections.
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            detections: Vec::new(),
        }
    }

    /// Build a result from raw backend output.
    ///
    /// Drops detections below `confidence_threshold` (and any with a
    /// non-finite confidence), sorts the rest by confidence descending and
    /// takes the first as the winner. Equal confidences keep backend order.
    pub fn from_detections(mut detections: Vec<Detection>, confidence_threshold: f64) -> Self {
        detections.retain(|d| d.confidence.is_finite() && d.confidence >= confidence_threshold);
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        match detections.first() {
            Some(top) => Self {
                label: top.label.clone(),
                confidence: top.confidence,
                detections,
            },
            None => Self::unknown(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

/// An encoded image ready to send to the detection backend.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// File name reported to the backend (informational only).
    pub file_name: String,
    /// MIME type of `bytes`.
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Errors from the detection backend.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The backend could not be reached (connect, DNS, TLS, timeout).
    #[error("detection backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with a non-success status.
    #[error("detection backend error ({status}): {body}")]
    Backend { status: u16, body: String },

    /// The backend answered 2xx but the body was not understood.
    #[error("invalid detection response: {0}")]
    InvalidResponse(String),
}

impl From<InferenceError> for CoreError {
    fn from(err: InferenceError) -> Self {
        CoreError::Inference(err.to_string())
    }
}

/// Inference backend seam.
///
/// Implementations return detections in whatever order the model produced
/// them; ordering and thresholding are handled by [`FrameClassifier`].
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, image: &ImagePayload) -> Result<Vec<Detection>, InferenceError>;
}

/// Single-image classifier over a shared [`Detector`].
#[derive(Clone)]
pub struct FrameClassifier {
    detector: Arc<dyn Detector>,
    confidence_threshold: f64,
}

impl FrameClassifier {
    pub fn new(detector: Arc<dyn Detector>, confidence_threshold: f64) -> Self {
        Self {
            detector,
            confidence_threshold,
        }
    }

    /// Classify one image. Backend failures propagate; they are never
    /// reported as `"unknown"`.
    pub async fn classify(&self, image: &ImagePayload) -> Result<ClassificationResult, InferenceError> {
        let detections = self.detector.detect(image).await?;
        Ok(ClassificationResult::from_detections(
            detections,
            self.confidence_threshold,
        ))
    }
}
