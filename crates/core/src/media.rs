//! Media classification.
//!
//! Uploads are classified purely by extension; content is never sniffed to
//! confirm that it matches.

use serde::Serialize;

/// Extensions accepted by default when `ALLOWED_EXTENSIONS` is not set.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "heic", "mp4", "mov", "webm"];

/// Extensions that mark a file as video.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm"];

/// Extensions that are converted from HEIF/HEIC to JPEG on upload.
pub const HEIC_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Directory prefix recorded in `media.media_path`.
pub const MEDIA_PATH_PREFIX: &str = "uploads/";

/// How an uploaded file is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// PNG, JPEG, GIF and friends: stored verbatim.
    Image,
    /// HEIF/HEIC photo: converted to JPEG.
    Heic,
    /// Video: stored verbatim, never inlined in the digest.
    Video,
}

impl MediaKind {
    /// Classify a lowercased extension (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        if HEIC_EXTENSIONS.contains(&ext) {
            MediaKind::Heic
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    /// Extension (with dot) the stored file ends up with.
    pub fn final_extension(self, original_ext: &str) -> String {
        match self {
            MediaKind::Heic => ".jpg".to_string(),
            MediaKind::Image | MediaKind::Video => format!(".{original_ext}"),
        }
    }

    pub fn is_video(self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

/// `media_path` value for a stored filename (`uploads/<filename>`).
pub fn media_path_for(stored_filename: &str) -> String {
    format!("{MEDIA_PATH_PREFIX}{stored_filename}")
}

/// Filename part of a `media_path` (its last `/` segment).
pub fn media_filename(media_path: &str) -> &str {
    media_path.rsplit('/').next().unwrap_or(media_path)
}
