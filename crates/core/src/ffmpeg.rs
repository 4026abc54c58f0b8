//! FFmpeg/FFprobe backed frame sampling.
//!
//! `ffprobe` supplies the frame geometry; `ffmpeg` then decodes only the
//! selected frames and pipes them to us as raw `rgb24`, so each frame is
//! exactly `width * height * 3` bytes on stdout and nothing touches disk.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use image::RgbImage;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::frames::{Frame, FrameSource, FrameStream, MediaError};

/// The part of `ffprobe -show_streams` JSON that sampling needs.
#[derive(Debug, Deserialize)]
pub struct StreamProbe {
    pub streams: Vec<ProbedStream>,
}

#[derive(Debug, Deserialize)]
pub struct ProbedStream {
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl StreamProbe {
    /// Geometry of the first video stream, if it has a usable one.
    pub fn video_resolution(&self) -> Option<(u32, u32)> {
        let stream = self
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))?;
        let width = u32::try_from(stream.width?).ok()?;
        let height = u32::try_from(stream.height?).ok()?;
        (width > 0 && height > 0).then_some((width, height))
    }
}

/// Run `ffprobe` on a video file.
pub async fn probe_streams(ffprobe_bin: &str, path: &Path) -> Result<StreamProbe, MediaError> {
    if !path.exists() {
        return Err(MediaError::NotFound(path.display().to_string()));
    }

    let output = Command::new(ffprobe_bin)
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .await
        .map_err(MediaError::DecoderUnavailable)?;

    if !output.status.success() {
        return Err(MediaError::DecodeFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    serde_json::from_slice::<StreamProbe>(&output.stdout).map_err(|e| {
        MediaError::ProbeParse(format!("{e}: {}", String::from_utf8_lossy(&output.stdout)))
    })
}

// ---------------------------------------------------------------------------
// Frame source
// ---------------------------------------------------------------------------

/// [`FrameSource`] backed by the `ffprobe` and `ffmpeg` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegFrameSource {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn open(&self, path: &Path, stride: u32) -> Result<Box<dyn FrameStream>, MediaError> {
        let stride = stride.max(1);
        let (width, height) = probe_streams(&self.ffprobe_bin, path)
            .await?
            .video_resolution()
            .ok_or_else(|| MediaError::NoVideoStream(path.display().to_string()))?;

        tracing::debug!(
            path = %path.display(),
            width,
            height,
            stride,
            "Opening video for frame sampling"
        );

        // `-noautorotate` keeps the output geometry equal to what ffprobe
        // reported, so the fixed frame size below stays valid.
        let mut child = Command::new(&self.ffmpeg_bin)
            .args(["-v", "error", "-noautorotate", "-i"])
            .arg(path)
            .args([
                "-vf",
                &format!("select=not(mod(n\\,{stride}))"),
                "-vsync",
                "0",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(MediaError::DecoderUnavailable)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::Io(std::io::Error::other("ffmpeg stdout not captured")))?;

        // Drain stderr concurrently so a chatty decoder can never block on a
        // full pipe while we are reading stdout.
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text).await;
                text
            })
        });

        Ok(Box::new(FfmpegFrameStream {
            path: path.to_path_buf(),
            child,
            stdout,
            stderr_task,
            width,
            height,
            frame_len: width as usize * height as usize * 3,
            stride: u64::from(stride),
            next_index: 0,
            finished: false,
        }))
    }
}

/// Raw-RGB frame stream read from an `ffmpeg` child process.
///
/// The child is spawned with `kill_on_drop`, so abandoning the stream
/// (including on a classifier error mid-video) terminates the decoder.
struct FfmpegFrameStream {
    path: PathBuf,
    child: Child,
    stdout: ChildStdout,
    stderr_task: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    frame_len: usize,
    stride: u64,
    next_index: u64,
    finished: bool,
}

impl FfmpegFrameStream {
    /// Reap the child and turn a non-zero exit into a decode error.
    async fn finish(&mut self) -> Result<(), MediaError> {
        self.finished = true;
        let status = self.child.wait().await?;
        if status.success() {
            return Ok(());
        }
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        tracing::warn!(
            path = %self.path.display(),
            exit_code = ?status.code(),
            "ffmpeg exited with an error while sampling frames"
        );
        Err(MediaError::DecodeFailed {
            exit_code: status.code(),
            stderr,
        })
    }
}

#[async_trait]
impl FrameStream for FfmpegFrameStream {
    async fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_len];
        let got = read_full(&mut self.stdout, &mut buf).await?;

        if got == 0 {
            self.finish().await?;
            return Ok(None);
        }
        if got < self.frame_len {
            let index = self.next_index;
            self.finish().await?;
            return Err(MediaError::TruncatedFrame {
                index,
                got,
                expected: self.frame_len,
            });
        }

        let image = RgbImage::from_raw(self.width, self.height, buf).ok_or_else(|| {
            MediaError::Io(std::io::Error::other("frame buffer does not match geometry"))
        })?;
        let frame = Frame {
            index: self.next_index,
            image,
        };
        self.next_index += self.stride;
        Ok(Some(frame))
    }
}

/// Read until `buf` is full or the reader hits EOF. Returns bytes read.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
