//! Upload media kinds, stored file naming, and disposal instructions.

use crate::error::CoreError;

/// Extensions accepted as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extensions accepted as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// What kind of analysis an upload gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Lower-cased extension of `file_name`, if any.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Classify an upload by its file extension.
pub fn media_kind_for(file_name: &str) -> Result<(MediaKind, String), CoreError> {
    let ext = extension_of(file_name).ok_or_else(|| {
        CoreError::Validation(format!("Unsupported file type: '{file_name}' has no extension"))
    })?;
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok((MediaKind::Image, ext))
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok((MediaKind::Video, ext))
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported file type '.{ext}'. Expected one of: {:?}",
            [IMAGE_EXTENSIONS, VIDEO_EXTENSIONS].concat()
        )))
    }
}

/// A collision-free name for storing an upload with extension `ext`.
pub fn stored_file_name(ext: &str) -> String {
    format!("{}.{ext}", uuid::Uuid::new_v4().simple())
}

/// Guess a Content-Type from a file name.
pub fn content_type_for(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// User-facing disposal hint for a label.
pub fn disposal_instructions(label: &str) -> String {
    format!("Dispose in the {label} recycling bin.")
}
