//! Entry model and DTOs.

use logbook_core::types::{DbId, EntryDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::media::Media;

/// A row from the `entry` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Entry {
    pub id: DbId,
    pub date: EntryDate,
    pub title: Option<String>,
    pub description: String,
}

/// DTO for creating a new entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntry {
    pub date: EntryDate,
    pub title: Option<String>,
    pub description: String,
}

/// An entry together with its media in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct EntryWithMedia {
    #[serde(flatten)]
    pub entry: Entry,
    pub media: Vec<Media>,
}
