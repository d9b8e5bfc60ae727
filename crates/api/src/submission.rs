//! Entry submission workflow.
//!
//! Turns one submitted form into one entry with all of its media, or into
//! nothing at all: files stored before a failure are deleted again and the
//! database rows are written in a single transaction.

use axum::extract::Multipart;
use chrono::NaiveDate;
use logbook_core::error::CoreError;
use logbook_core::ingest::{IngestError, MediaIngestor, SavedFiles};
use logbook_db::models::entry::{CreateEntry, EntryWithMedia};
use logbook_db::models::media::CreateMedia;
use logbook_db::repositories::EntryRepo;
use logbook_db::DbPool;

use crate::error::{AppError, AppResult};

/// Multipart field carrying the uploaded files (repeated).
pub const FILES_FIELD: &str = "photos";

/// One file part of the submitted form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename claimed by the client, unsanitized.
    pub filename: String,
    pub data: Vec<u8>,
}

/// The fields of a `POST /new-entry` form.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub title: Option<String>,
    /// `None` when the field was absent; an empty string is accepted.
    pub description: Option<String>,
    pub files: Vec<UploadedFile>,
}

impl SubmissionForm {
    /// Read `title`, `description` and every `photos` part; other fields are
    /// ignored.
    pub async fn from_multipart(multipart: &mut Multipart) -> AppResult<Self> {
        let mut form = SubmissionForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "title" => form.title = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                FILES_FIELD => {
                    let filename = field.file_name().unwrap_or("").to_string();
                    let data = field.bytes().await?;
                    form.files.push(UploadedFile {
                        filename,
                        data: data.to_vec(),
                    });
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Trimmed title, `None` when blank.
pub fn normalize_title(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Persist a submitted form as an entry dated `today`.
///
/// Files are ingested in submission order and the first failure aborts the
/// whole submission. Stored files are removed again unless the entry and
/// all media rows commit.
pub async fn submit_entry(
    pool: &DbPool,
    ingestor: &MediaIngestor,
    form: SubmissionForm,
    today: NaiveDate,
) -> AppResult<EntryWithMedia> {
    match form.files.first() {
        Some(first) if !first.filename.is_empty() => {}
        _ => return Err(CoreError::from(IngestError::MissingFile).into()),
    }

    let description = form
        .description
        .ok_or_else(|| AppError::BadRequest("Description is required!".into()))?;
    let title = normalize_title(form.title.as_deref());

    let mut saved = SavedFiles::new();
    let mut media = Vec::with_capacity(form.files.len());
    for file in &form.files {
        let stored = ingestor
            .ingest(&file.filename, &file.data)
            .await
            .map_err(CoreError::from)?;
        saved.track(&stored.disk_path);
        media.push(CreateMedia {
            media_path: stored.media_path,
            is_video: stored.is_video,
        });
    }

    if media.is_empty() {
        return Err(CoreError::from(IngestError::MissingFile).into());
    }

    let input = CreateEntry {
        date: today,
        title,
        description,
    };
    let created = EntryRepo::create_with_media(pool, &input, &media).await?;
    saved.keep();

    tracing::info!(
        entry_id = created.entry.id,
        date = %created.entry.date,
        media_count = created.media.len(),
        "Entry created"
    );
    Ok(created)
}
