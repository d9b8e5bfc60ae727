//! What goes into a digest: the entries in the window and, for every media
//! item, whether it is embedded inline or linked externally.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use logbook_db::models::entry::EntryWithMedia;
use logbook_db::models::media::Media;

use crate::window::DigestWindow;

/// One media file as it appears in the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Stored filename; also the inline Content-ID.
    pub filename: String,
    /// Upload root joined with `filename`.
    pub local_path: PathBuf,
    pub is_video: bool,
    /// Shown as a link instead of an inline image.
    pub is_external_link: bool,
    pub external_url: String,
}

/// One entry as it appears in the digest.
#[derive(Debug, Clone)]
pub struct DigestEntry {
    pub date: NaiveDate,
    pub title: Option<String>,
    pub description: String,
    pub media_items: Vec<MediaItem>,
}

#[derive(Debug, Clone)]
pub struct DigestPlan {
    pub window: DigestWindow,
    pub entries: Vec<DigestEntry>,
}

impl DigestPlan {
    /// Build the plan for `entries`, which are expected newest first.
    pub fn build(
        window: DigestWindow,
        entries: &[EntryWithMedia],
        upload_dir: &Path,
        max_inline_bytes: u64,
        base_url: &str,
    ) -> Self {
        let entries = entries
            .iter()
            .map(|item| DigestEntry {
                date: item.entry.date,
                title: item.entry.title.clone(),
                description: item.entry.description.clone(),
                media_items: item
                    .media
                    .iter()
                    .map(|m| plan_media(m, upload_dir, max_inline_bytes, base_url))
                    .collect(),
            })
            .collect();

        Self { window, entries }
    }

    /// Every media item across all entries, in display order.
    pub fn media(&self) -> impl Iterator<Item = &MediaItem> {
        self.entries.iter().flat_map(|e| e.media_items.iter())
    }

    pub fn media_count(&self) -> usize {
        self.media().count()
    }
}

/// Decide how one stored media file is presented.
///
/// Videos are always linked. Images are linked when the file is missing or
/// larger than `max_inline_bytes`; existence is checked before size.
pub fn plan_media(media: &Media, upload_dir: &Path, max_inline_bytes: u64, base_url: &str) -> MediaItem {
    let filename = media.filename().to_string();
    let local_path = upload_dir.join(&filename);

    let is_external_link = media.is_video
        || match std::fs::metadata(&local_path) {
            Ok(meta) => meta.len() > max_inline_bytes,
            Err(_) => true,
        };

    MediaItem {
        external_url: format!("{base_url}{filename}"),
        filename,
        local_path,
        is_video: media.is_video,
        is_external_link,
    }
}
