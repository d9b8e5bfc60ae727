//! Media model and DTOs.

use logbook_core::media::media_filename;
use logbook_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `media` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Media {
    pub id: DbId,
    pub entry_id: DbId,
    /// Path relative to the upload root's parent, e.g. `uploads/<file>`.
    pub media_path: String,
    pub is_video: bool,
}

impl Media {
    /// Stored filename, i.e. the last segment of `media_path`.
    pub fn filename(&self) -> &str {
        media_filename(&self.media_path)
    }
}

/// DTO for one media row created alongside its entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMedia {
    pub media_path: String,
    pub is_video: bool,
}
