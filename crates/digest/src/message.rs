//! MIME assembly for the digest email.
//!
//! Layout: `multipart/mixed` holding one `multipart/related` part, which
//! holds the HTML body followed by every embedded image. Images are
//! referenced from the HTML as `cid:<filename>`.

use std::path::{Path, PathBuf};

use lettre::message::header::{ContentDisposition, ContentId, ContentType};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::Message;
use logbook_core::imaging::compress_image;
use tempfile::TempPath;

use crate::email::EmailError;
use crate::plan::MediaItem;

/// A ready-to-send message plus the temporary files it was built from.
///
/// Keep `temporaries` alive until the send attempt is over; dropping them
/// deletes the files.
pub struct AssembledMessage {
    pub message: Message,
    /// Filenames embedded as inline parts, in order.
    pub embedded: Vec<String>,
    pub temporaries: Vec<TempPath>,
}

/// Addressing and limits for one digest message.
#[derive(Debug, Clone)]
pub struct MessageSpec {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Images above this size are re-encoded before embedding.
    pub max_inline_bytes: u64,
    /// Directory for re-encoded copies.
    pub temp_dir: PathBuf,
}

/// Run [`build_message`] on the blocking thread pool.
///
/// Assembly reads every embedded file and may re-encode images, so it must
/// not run on an async worker.
pub async fn assemble(
    spec: MessageSpec,
    media: Vec<MediaItem>,
) -> Result<AssembledMessage, EmailError> {
    tokio::task::spawn_blocking(move || build_message(spec, &media))
        .await
        .map_err(|e| EmailError::Build(format!("message assembly task failed: {e}")))?
}

/// Build the digest message, embedding every media item that should be
/// inline.
///
/// Items are re-checked at attach time: files that went missing are skipped
/// with a warning, videos and linked items are never attached, and an image
/// that has grown past the limit is re-encoded into a temporary file that is
/// used only when it came out smaller.
pub fn build_message<'m>(
    spec: MessageSpec,
    media: impl IntoIterator<Item = &'m MediaItem>,
) -> Result<AssembledMessage, EmailError> {
    let from: Mailbox = spec.from.parse()?;
    let to: Mailbox = spec.to.parse()?;

    let mut related = MultiPart::related().singlepart(SinglePart::html(spec.html));
    let mut embedded = Vec::new();
    let mut temporaries = Vec::new();

    for item in media {
        let size = match std::fs::metadata(&item.local_path) {
            Ok(meta) => meta.len(),
            Err(_) => {
                tracing::warn!(path = %item.local_path.display(), "Media file not found, skipping");
                continue;
            }
        };

        if item.is_video || item.is_external_link {
            tracing::info!(file = %item.filename, "Linked instead of attached");
            continue;
        }

        let source = if size > spec.max_inline_bytes {
            shrink(item, &spec.temp_dir, &mut temporaries)
        } else {
            item.local_path.clone()
        };

        match inline_part(&item.filename, &source) {
            Ok(part) => {
                related = related.singlepart(part);
                embedded.push(item.filename.clone());
                tracing::info!(file = %item.filename, "Embedded inline image");
            }
            Err(e) => {
                tracing::warn!(file = %item.filename, error = %e, "Failed to embed image, skipping");
            }
        }
    }

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(spec.subject)
        .multipart(MultiPart::mixed().multipart(related))
        .map_err(|e| EmailError::Build(e.to_string()))?;

    Ok(AssembledMessage {
        message,
        embedded,
        temporaries,
    })
}

/// Path to embed for an oversized image: a smaller re-encoded copy when one
/// can be made, otherwise the original.
fn shrink(item: &MediaItem, temp_dir: &Path, temporaries: &mut Vec<TempPath>) -> PathBuf {
    match compress_image(&item.local_path, temp_dir) {
        Ok(Some(compressed)) => {
            tracing::info!(file = %item.filename, compressed_bytes = compressed.size, "Compressed oversized image");
            let path = compressed.path.to_path_buf();
            temporaries.push(compressed.path);
            path
        }
        Ok(None) => item.local_path.clone(),
        Err(e) => {
            tracing::warn!(file = %item.filename, error = %e, "Compression failed, using original");
            item.local_path.clone()
        }
    }
}

fn inline_part(filename: &str, path: &Path) -> Result<SinglePart, EmailError> {
    let data = std::fs::read(path).map_err(|e| EmailError::Build(e.to_string()))?;
    let mime = mime_guess::from_path(filename).first_or_octet_stream();
    let content_type =
        ContentType::parse(mime.essence_str()).map_err(|e| EmailError::Build(e.to_string()))?;

    Ok(SinglePart::builder()
        .header(content_type)
        .header(ContentDisposition::inline_with_name(filename))
        .header(ContentId::from(format!("<{filename}>")))
        .body(data))
}
