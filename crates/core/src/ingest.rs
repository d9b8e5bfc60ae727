//! Media ingestion: one uploaded file in, one stored media file out.
//!
//! [`MediaIngestor::ingest`] validates the client filename, classifies the
//! upload, writes it under the upload root (converting HEIC to JPEG on the
//! way) and reports the `media_path` to record in the database.
//!
//! [`SavedFiles`] lets a caller that ingests several files roll all of them
//! back when a later step fails.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::StorageConfig;
use crate::error::CoreError;
use crate::filename::{extension_of, secure_filename, split_extension, stored_filename, with_suffix};
use crate::imaging::{convert_heic_to_jpeg, ImagingError};
use crate::media::{media_path_for, MediaKind};

/// Attempts at finding a free stored name before giving up.
const MAX_NAME_ATTEMPTS: usize = 8;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// No file part, or a part with an empty filename.
    #[error("Photo is required!")]
    MissingFile,

    #[error("Invalid file type '{0}'. Only images and videos are allowed.")]
    DisallowedExtension(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Imaging(#[from] ImagingError),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<IngestError> for CoreError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MissingFile | IngestError::DisallowedExtension(_) => {
                CoreError::Validation(err.to_string())
            }
            IngestError::Task(msg) => CoreError::Internal(msg),
            other => CoreError::Processing(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A file written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedMedia {
    /// Value for `media.media_path` (`uploads/<stored_filename>`).
    pub media_path: String,
    pub stored_filename: String,
    /// Absolute or cwd-relative location on disk.
    pub disk_path: PathBuf,
    pub is_video: bool,
}

// ---------------------------------------------------------------------------
// MediaIngestor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MediaIngestor {
    upload_dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl MediaIngestor {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    pub fn is_allowed(&self, ext: &str) -> bool {
        self.allowed_extensions.iter().any(|allowed| allowed == ext)
    }

    /// Ingest one upload, timestamping it with the current local time.
    pub async fn ingest(
        &self,
        original_filename: &str,
        data: &[u8],
    ) -> Result<IngestedMedia, IngestError> {
        self.ingest_at(original_filename, data, chrono::Local::now().naive_local())
            .await
    }

    /// Ingest one upload with an explicit upload time.
    ///
    /// Nothing is written when the filename is empty or its extension is not
    /// allowed. On a processing failure the partially written stored file is
    /// removed.
    pub async fn ingest_at(
        &self,
        original_filename: &str,
        data: &[u8],
        uploaded_at: NaiveDateTime,
    ) -> Result<IngestedMedia, IngestError> {
        if original_filename.trim().is_empty() {
            return Err(IngestError::MissingFile);
        }

        let safe_name = secure_filename(original_filename);
        let ext = extension_of(&safe_name).unwrap_or_default();
        if ext.is_empty() || !self.is_allowed(&ext) {
            return Err(IngestError::DisallowedExtension(ext));
        }

        let kind = MediaKind::from_extension(&ext);
        let (base, _) = split_extension(&safe_name);
        let wanted = stored_filename(uploaded_at, base, &kind.final_extension(&ext));

        fs::create_dir_all(&self.upload_dir).await?;
        let (file, stored_name) = self.reserve(&wanted).await?;
        let disk_path = self.upload_dir.join(&stored_name);

        if let Err(err) = self.write_payload(kind, file, &disk_path, data).await {
            if let Err(cleanup) = fs::remove_file(&disk_path).await {
                tracing::warn!(path = %disk_path.display(), error = %cleanup, "Failed to remove partial upload");
            }
            return Err(err);
        }

        tracing::debug!(
            original = original_filename,
            stored = %stored_name,
            ?kind,
            bytes = data.len(),
            "Stored upload"
        );

        Ok(IngestedMedia {
            media_path: media_path_for(&stored_name),
            stored_filename: stored_name,
            disk_path,
            is_video: kind.is_video(),
        })
    }

    /// Create the stored file exclusively, suffixing the name if it is taken.
    async fn reserve(&self, wanted: &str) -> Result<(File, String), IngestError> {
        let mut name = wanted.to_string();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.upload_dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((file, name)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let suffix = uuid::Uuid::new_v4().simple().to_string();
                    name = with_suffix(wanted, &suffix[..8]);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(IngestError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free stored name for {wanted}"),
        )))
    }

    async fn write_payload(
        &self,
        kind: MediaKind,
        mut file: File,
        disk_path: &Path,
        data: &[u8],
    ) -> Result<(), IngestError> {
        match kind {
            MediaKind::Image | MediaKind::Video => {
                file.write_all(data).await?;
                file.flush().await?;
                Ok(())
            }
            MediaKind::Heic => {
                drop(file);
                // Raw HEIC bytes go to a scoped temporary next to the final
                // file; dropping the TempPath removes it on every path.
                let raw = tempfile::Builder::new()
                    .prefix("temp_")
                    .suffix(".heic")
                    .tempfile_in(&self.upload_dir)?;
                fs::write(raw.path(), data).await?;
                let raw = raw.into_temp_path();

                let dest = disk_path.to_path_buf();
                tokio::task::spawn_blocking(move || {
                    let result = convert_heic_to_jpeg(&raw, &dest);
                    drop(raw);
                    result
                })
                .await
                .map_err(|e| IngestError::Task(e.to_string()))??;
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SavedFiles
// ---------------------------------------------------------------------------

/// Files written during one submission.
///
/// Every tracked file is deleted on drop unless [`SavedFiles::keep`] was
/// called, so an aborted submission leaves nothing behind on disk.
#[derive(Debug, Default)]
pub struct SavedFiles {
    paths: Vec<PathBuf>,
}

impl SavedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Commit: the tracked files stay on disk.
    pub fn keep(mut self) {
        self.paths.clear();
    }
}

impl Drop for SavedFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::info!(path = %path.display(), "Rolled back stored upload"),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to roll back stored upload")
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
