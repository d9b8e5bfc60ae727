//! Storage configuration shared by the API server and the digest job.

use std::path::PathBuf;

use crate::media::DEFAULT_ALLOWED_EXTENSIONS;

/// Where uploads live and which extensions are accepted.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Upload root; `media.media_path` values are relative to its parent.
    pub upload_dir: PathBuf,
    /// Lowercased extensions (without the dot) accepted on upload.
    pub allowed_extensions: Vec<String>,
}

impl StorageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                              |
    /// |----------------------|--------------------------------------|
    /// | `UPLOAD_DIR`         | `uploads`                            |
    /// | `ALLOWED_EXTENSIONS` | `png,jpg,jpeg,gif,heic,mp4,mov,webm` |
    pub fn from_env() -> Self {
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let allowed_extensions = std::env::var("ALLOWED_EXTENSIONS")
            .map(|raw| parse_extension_list(&raw))
            .unwrap_or_else(|_| default_extensions());

        Self {
            upload_dir,
            allowed_extensions,
        }
    }

    /// Config rooted at `upload_dir` with the default extension set.
    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            allowed_extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

/// Parse a comma-separated extension list, tolerating dots and case.
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
