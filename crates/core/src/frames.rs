//! In-memory video frames and the frame-source seam.
//!
//! A [`FrameSource`] opens a video and yields every `stride`-th frame as a
//! decoded RGB buffer through a [`FrameStream`]. Streams are single-pass:
//! once exhausted or dropped they cannot be rewound.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};

use crate::detection::ImagePayload;
use crate::error::CoreError;

/// JPEG content type used when shipping frames to the detector.
pub const FRAME_CONTENT_TYPE: &str = "image/jpeg";

/// Errors raised while opening or decoding media.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media file not found: {0}")]
    NotFound(String),

    /// The ffmpeg/ffprobe binary could not be started.
    #[error("media decoder unavailable: {0}")]
    DecoderUnavailable(std::io::Error),

    #[error("media decoding failed (exit code {exit_code:?}): {stderr}")]
    DecodeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse probe output: {0}")]
    ProbeParse(String),

    #[error("no video stream in {0}")]
    NoVideoStream(String),

    #[error("frame {index} truncated: got {got} of {expected} bytes")]
    TruncatedFrame {
        index: u64,
        got: usize,
        expected: usize,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for CoreError {
    fn from(err: MediaError) -> Self {
        match err {
            // A missing decoder binary is a deployment problem, not bad input.
            MediaError::DecoderUnavailable(e) => {
                CoreError::Internal(format!("media decoder unavailable: {e}"))
            }
            other => CoreError::MediaRead(other.to_string()),
        }
    }
}

/// One sampled frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based position in the source video.
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    /// Encode the frame as JPEG for the detection backend.
    pub fn to_payload(&self) -> Result<ImagePayload, MediaError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;
        Ok(ImagePayload {
            file_name: format!("frame_{:06}.jpg", self.index),
            content_type: FRAME_CONTENT_TYPE,
            bytes,
        })
    }
}

/// A lazy, finite, single-pass sequence of frames.
#[async_trait]
pub trait FrameStream: Send {
    /// Next sampled frame, or `None` once the video is exhausted.
    async fn next_frame(&mut self) -> Result<Option<Frame>, MediaError>;
}

/// Media decoder seam.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Open `path` and sample frames at positions `0, stride, 2*stride, ...`.
    ///
    /// `stride` is always at least 1.
    async fn open(&self, path: &Path, stride: u32) -> Result<Box<dyn FrameStream>, MediaError>;
}
