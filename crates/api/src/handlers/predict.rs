//! Handler for `POST /predict`: store an upload and classify it.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use ecosort_core::classification::validate_frame_interval;
use ecosort_core::detection::ClassificationResult;
use ecosort_core::media::{disposal_instructions, media_kind_for, stored_file_name, MediaKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct PredictParams {
    /// Sample every n-th video frame. Ignored for images.
    pub frame_interval: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Name of the file as uploaded.
    pub filename: String,
    /// Where the stored copy is served from.
    pub file_url: String,
    pub label: String,
    pub confidence: f64,
    pub bboxes: Vec<[f64; 4]>,
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames_sampled: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames_voted: Option<u32>,
    /// Per-label frame votes, in first-seen order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<IndexMap<String, u32>>,
}

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// POST /api/v1/predict
///
/// `.jpg/.jpeg/.png` uploads are classified directly; `.mp4/.avi/.mov`
/// uploads are sampled every `frame_interval` frames and majority-voted.
pub async fn predict(
    State(state): State<AppState>,
    Query(params): Query<PredictParams>,
    multipart: Multipart,
) -> AppResult<Json<PredictResponse>> {
    let upload = read_upload(multipart).await?;
    let (kind, ext) = media_kind_for(&upload.file_name)?;

    let frame_interval = match (kind, params.frame_interval) {
        (MediaKind::Video, Some(n)) => validate_frame_interval(n)?,
        _ => state.config.detector.default_frame_interval,
    };

    let uploads_dir = state.config.uploads_dir();
    tokio::fs::create_dir_all(&uploads_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;
    let stored_name = stored_file_name(&ext);
    let stored_path = uploads_dir.join(&stored_name);
    tokio::fs::write(&stored_path, &upload.bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    tracing::info!(
        filename = %upload.file_name,
        stored = %stored_path.display(),
        bytes = upload.bytes.len(),
        ?kind,
        "Stored upload",
    );

    let base = PredictResponse {
        filename: upload.file_name,
        file_url: format!("/static/uploads/{stored_name}"),
        label: String::new(),
        confidence: 0.0,
        bboxes: Vec::new(),
        instructions: String::new(),
        frames_sampled: None,
        frames_voted: None,
        votes: None,
    };

    let response = match kind {
        MediaKind::Image => {
            let result = state.classifier.classify_image(&stored_path).await?;
            image_response(base, result)
        }
        MediaKind::Video => {
            let verdict = state
                .classifier
                .classify_video(&stored_path, frame_interval)
                .await?;
            PredictResponse {
                instructions: disposal_instructions(&verdict.label),
                label: verdict.label,
                confidence: verdict.confidence,
                frames_sampled: Some(verdict.frames_sampled),
                frames_voted: Some(verdict.frames_voted),
                votes: Some(verdict.tally),
                ..base
            }
        }
    };

    Ok(Json(response))
}

fn image_response(base: PredictResponse, result: ClassificationResult) -> PredictResponse {
    PredictResponse {
        instructions: disposal_instructions(&result.label),
        bboxes: result.detections.iter().map(|d| d.bbox).collect(),
        label: result.label,
        confidence: result.confidence,
        ..base
    }
}

/// Pull the `file` field out of the form; other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> AppResult<Upload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // Browsers may send a path; keep only the final component.
        let file_name = field
            .file_name()
            .and_then(|n| n.rsplit(['/', '\\']).next())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::BadRequest("Uploaded file has no file name".into()))?
            .to_string();
        let bytes = field.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }
        return Ok(Upload { file_name, bytes });
    }
    Err(AppError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}
