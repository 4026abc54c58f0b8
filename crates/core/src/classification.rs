//! Image and video classification service.
//!
//! [`ClassificationService`] is built once at startup with an explicit
//! [`Detector`] and [`FrameSource`] and shared through application state.

use std::path::Path;
use std::sync::Arc;

use crate::aggregation::{VideoVerdict, VoteTally};
use crate::detection::{
    ClassificationResult, Detector, FrameClassifier, ImagePayload, DEFAULT_CONFIDENCE_THRESHOLD,
};
use crate::error::CoreError;
use crate::frames::{FrameSource, MediaError};
use crate::media::content_type_for;

/// Default video sampling stride (every 30th frame).
pub const DEFAULT_FRAME_INTERVAL: u32 = 30;

/// Default cap on the number of frames classified per video.
pub const DEFAULT_MAX_VIDEO_FRAMES: u32 = 300;

/// Tunables for [`ClassificationService`].
#[derive(Debug, Clone)]
pub struct ClassificationSettings {
    pub confidence_threshold: f64,
    /// Upper bound on sampled frames per video; sampling stops once reached.
    pub max_video_frames: u32,
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_video_frames: DEFAULT_MAX_VIDEO_FRAMES,
        }
    }
}

/// Validate a caller-supplied frame interval.
pub fn validate_frame_interval(interval: i64) -> Result<u32, CoreError> {
    if interval < 1 {
        return Err(CoreError::Validation(format!(
            "frame_interval must be a positive integer, got {interval}"
        )));
    }
    u32::try_from(interval).map_err(|_| {
        CoreError::Validation(format!("frame_interval {interval} is too large"))
    })
}

pub struct ClassificationService {
    classifier: FrameClassifier,
    frames: Arc<dyn FrameSource>,
    settings: ClassificationSettings,
}

impl ClassificationService {
    pub fn new(
        detector: Arc<dyn Detector>,
        frames: Arc<dyn FrameSource>,
        settings: ClassificationSettings,
    ) -> Self {
        Self {
            classifier: FrameClassifier::new(detector, settings.confidence_threshold),
            frames,
            settings,
        }
    }

    /// Classify a single image file.
    ///
    /// The header is decoded first so unreadable files fail with
    /// [`CoreError::MediaRead`] before the backend is called.
    pub async fn classify_image(&self, path: &Path) -> Result<ClassificationResult, CoreError> {
        let (width, height) = image::ImageReader::open(path)
            .map_err(MediaError::from)?
            .with_guessed_format()
            .map_err(MediaError::from)?
            .into_dimensions()
            .map_err(MediaError::from)?;

        let bytes = tokio::fs::read(path).await.map_err(MediaError::from)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let payload = ImagePayload {
            content_type: content_type_for(&file_name),
            file_name,
            bytes,
        };

        let result = self.classifier.classify(&payload).await?;
        tracing::info!(
            path = %path.display(),
            width,
            height,
            label = %result.label,
            confidence = result.confidence,
            detections = result.detections.len(),
            "Classified image"
        );
        Ok(result)
    }

    /// Classify a video by sampling every `frame_interval`-th frame and
    /// majority-voting the per-frame results.
    ///
    /// Any classifier error aborts the whole video; dropping the frame
    /// stream on that path stops the decoder.
    pub async fn classify_video(
        &self,
        path: &Path,
        frame_interval: u32,
    ) -> Result<VideoVerdict, CoreError> {
        let frame_interval = validate_frame_interval(i64::from(frame_interval))?;
        let mut stream = self.frames.open(path, frame_interval).await?;
        let mut tally = VoteTally::new();

        while let Some(frame) = stream.next_frame().await? {
            if tally.frames_sampled() >= self.settings.max_video_frames {
                tracing::warn!(
                    path = %path.display(),
                    max_frames = self.settings.max_video_frames,
                    "Frame cap reached, ignoring the rest of the video"
                );
                break;
            }
            let payload = frame.to_payload()?;
            let result = self.classifier.classify(&payload).await.map_err(|e| {
                tracing::error!(frame = frame.index, error = %e, "Frame classification failed");
                CoreError::from(e)
            })?;
            tracing::debug!(
                frame = frame.index,
                label = %result.label,
                confidence = result.confidence,
                "Classified frame"
            );
            tally.record(&result);
        }

        let verdict = tally.verdict();
        tracing::info!(
            path = %path.display(),
            frame_interval,
            frames_sampled = verdict.frames_sampled,
            frames_voted = verdict.frames_voted,
            label = %verdict.label,
            confidence = verdict.confidence,
            "Classified video"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use image::RgbImage;

    use super::*;
    use crate::detection::{Detection, InferenceError};
    use crate::frames::{Frame, FrameStream};

    /// Detector that replays a fixed script, one entry per call.
    struct ScriptedDetector {
        script: Mutex<VecDeque<Result<Vec<Detection>, InferenceError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Result<Vec<Detection>, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Detector for ScriptedDetector {
        async fn detect(&self, _image: &ImagePayload) -> Result<Vec<Detection>, InferenceError> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Frame source producing `count` tiny frames at the requested stride.
    struct FakeFrames {
        count: u64,
    }

    struct FakeStream {
        remaining: u64,
        stride: u64,
        next: u64,
    }

    #[async_trait]
    impl FrameStream for FakeStream {
        async fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            let frame = Frame {
                index: self.next,
                image: RgbImage::new(2, 2),
            };
            self.next += self.stride;
            Ok(Some(frame))
        }
    }

    #[async_trait]
    impl FrameSource for FakeFrames {
        async fn open(&self, _path: &Path, stride: u32) -> Result<Box<dyn FrameStream>, MediaError> {
            Ok(Box::new(FakeStream {
                remaining: self.count,
                stride: u64::from(stride),
                next: 0,
            }))
        }
    }

    struct BrokenFrames;

    #[async_trait]
    impl FrameSource for BrokenFrames {
        async fn open(&self, path: &Path, _stride: u32) -> Result<Box<dyn FrameStream>, MediaError> {
            Err(MediaError::DecodeFailed {
                exit_code: Some(1),
                stderr: format!("{}: Invalid data found when processing input", path.display()),
            })
        }
    }

    fn det(label: &str, confidence: f64) -> Vec<Detection> {
        vec![Detection {
            label: label.to_string(),
            confidence,
            bbox: [1.0, 2.0, 3.0, 4.0],
        }]
    }

    fn service(detector: Arc<ScriptedDetector>, frames: u64, max: u32) -> ClassificationService {
        ClassificationService::new(
            detector,
            Arc::new(FakeFrames { count: frames }),
            ClassificationSettings {
                confidence_threshold: 0.5,
                max_video_frames: max,
            },
        )
    }

    #[tokio::test]
    async fn video_majority_vote_with_global_average() {
        let detector = ScriptedDetector::new(vec![Ok(det("A", 0.9)), Ok(det("A", 0.7)), Ok(det("B", 0.95))]);
        let svc = service(detector.clone(), 3, 100);

        let verdict = svc.classify_video(Path::new("clip.mp4"), 30).await.unwrap();
        assert_eq!(verdict.label, "A");
        assert!((verdict.confidence - 0.85167).abs() < 1e-4);
        assert_eq!(detector.calls(), 3);
    }

    #[tokio::test]
    async fn unknown_frames_still_consume_classifier_calls() {
        let detector = ScriptedDetector::new(vec![Ok(vec![]), Ok(det("glass", 0.3)), Ok(det("glass", 0.8))]);
        let svc = service(detector.clone(), 3, 100);

        let verdict = svc.classify_video(Path::new("clip.mp4"), 10).await.unwrap();
        assert_eq!(verdict.label, "glass");
        assert_eq!(verdict.frames_sampled, 3);
        assert_eq!(verdict.frames_voted, 1);
        assert_eq!(detector.calls(), 3);
    }

    #[tokio::test]
    async fn classifier_error_aborts_video() {
        let detector = ScriptedDetector::new(vec![
            Ok(det("paper", 0.9)),
            Err(InferenceError::Backend {
                status: 503,
                body: "model loading".into(),
            }),
            Ok(det("paper", 0.9)),
        ]);
        let svc = service(detector.clone(), 3, 100);

        let result = svc.classify_video(Path::new("clip.mp4"), 30).await;
        assert_matches!(result, Err(CoreError::Inference(_)));
        assert_eq!(detector.calls(), 2);
    }

    #[tokio::test]
    async fn frame_cap_limits_classifier_calls() {
        let detector = ScriptedDetector::new(vec![]);
        let svc = service(detector.clone(), 50, 5);

        let verdict = svc.classify_video(Path::new("long.mp4"), 1).await.unwrap();
        assert_eq!(verdict.frames_sampled, 5);
        assert_eq!(detector.calls(), 5);
        assert!(verdict.is_unknown());
    }

    #[tokio::test]
    async fn undecodable_video_is_media_read_error() {
        let svc = ClassificationService::new(
            ScriptedDetector::new(vec![]),
            Arc::new(BrokenFrames),
            ClassificationSettings::default(),
        );
        let result = svc.classify_video(Path::new("broken.mp4"), 30).await;
        assert_matches!(result, Err(CoreError::MediaRead(_)));
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let svc = service(ScriptedDetector::new(vec![]), 3, 100);
        let result = svc.classify_video(Path::new("clip.mp4"), 0).await;
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn frame_interval_validation() {
        assert_eq!(validate_frame_interval(30).unwrap(), 30);
        assert_matches!(validate_frame_interval(0), Err(CoreError::Validation(_)));
        assert_matches!(validate_frame_interval(-5), Err(CoreError::Validation(_)));
        assert_matches!(validate_frame_interval(i64::MAX), Err(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn image_classification_picks_top_detection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bottle.png");
        RgbImage::new(8, 8).save(&path).unwrap();

        let detector = ScriptedDetector::new(vec![Ok(vec![
            Detection {
                label: "paper".into(),
                confidence: 0.6,
                bbox: [0.0, 0.0, 4.0, 4.0],
            },
            Detection {
                label: "plastic".into(),
                confidence: 0.92,
                bbox: [2.0, 2.0, 8.0, 8.0],
            },
        ])]);
        let svc = service(detector, 0, 100);

        let result = svc.classify_image(&path).await.unwrap();
        assert_eq!(result.label, "plastic");
        assert_eq!(result.detections.len(), 2);
    }

    #[tokio::test]
    async fn unreadable_image_is_media_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let detector = ScriptedDetector::new(vec![]);
        let svc = service(detector.clone(), 0, 100);

        let result = svc.classify_image(&path).await;
        assert_matches!(result, Err(CoreError::MediaRead(_)));
        assert_eq!(detector.calls(), 0);
    }
}
