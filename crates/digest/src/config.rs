use std::path::PathBuf;

use crate::job::DigestError;

/// Default trailing window length in days (today is added on top).
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Default size above which images are linked instead of embedded (10 MiB).
pub const DEFAULT_MAX_INLINE_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Sender used when none of `SMTP_FROM`, `SMTP_USER` or `EMAIL_ADDRESS` is set.
pub const DEFAULT_SENDER: &str = "logbook@localhost";

/// Everything the digest job needs besides the database and the transport.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Upload root holding the stored media files.
    pub upload_dir: PathBuf,
    /// Days before today covered by the digest.
    pub window_days: i64,
    /// Images larger than this are linked, not embedded.
    pub max_inline_image_bytes: u64,
    /// Prefix for external media links; the stored filename is appended.
    pub cloud_storage_base_url: String,
    pub sender: String,
    pub recipient: String,
    /// Where compressed copies of oversized images are written.
    pub temp_dir: PathBuf,
}

impl DigestConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                      | Required | Default                                                |
    /// |-------------------------------|----------|--------------------------------------------------------|
    /// | `DIGEST_RECIPIENT`            | yes      | `RECIPIENT_EMAIL`                                      |
    /// | `UPLOAD_DIR`                  | no       | `uploads`                                              |
    /// | `DIGEST_WINDOW_DAYS`          | no       | `7`                                                    |
    /// | `MAX_INLINE_IMAGE_SIZE_BYTES` | no       | `10485760`                                             |
    /// | `CLOUD_STORAGE_BASE_URL`      | no       | empty                                                  |
    /// | `SMTP_FROM`                   | no       | `SMTP_USER`, then `EMAIL_ADDRESS`, else `logbook@localhost` |
    pub fn from_env() -> Result<Self, DigestError> {
        let recipient = first_var(RECIPIENT_VARS).ok_or_else(|| {
            DigestError::Config("DIGEST_RECIPIENT (or RECIPIENT_EMAIL) must be set".into())
        })?;

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let window_days = parse_var("DIGEST_WINDOW_DAYS", DEFAULT_WINDOW_DAYS)?;
        let max_inline_image_bytes =
            parse_var("MAX_INLINE_IMAGE_SIZE_BYTES", DEFAULT_MAX_INLINE_IMAGE_BYTES)?;

        let sender = first_var(SENDER_VARS).unwrap_or_else(|| DEFAULT_SENDER.to_string());

        Ok(Self {
            upload_dir,
            window_days,
            max_inline_image_bytes,
            cloud_storage_base_url: std::env::var("CLOUD_STORAGE_BASE_URL").unwrap_or_default(),
            sender,
            recipient,
            temp_dir: std::env::temp_dir(),
        })
    }
}

const RECIPIENT_VARS: &[&str] = &["DIGEST_RECIPIENT", "RECIPIENT_EMAIL"];
const SENDER_VARS: &[&str] = &["SMTP_FROM", "SMTP_USER", "EMAIL_ADDRESS"];

/// Value of the first variable in `names` that is set and non-empty.
///
/// Later names are older aliases, so existing `.env` files keep working.
pub(crate) fn first_var(names: &[&str]) -> Option<String> {
    first_of(names, |name| std::env::var(name).ok())
}

fn first_of(names: &[&str], lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, DigestError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DigestError::Config(format!("{name} must be a valid number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
