//! Integration tests for the weekly digest job.
//!
//! Runs `run_weekly_digest` against a real SQLite database and an in-memory
//! transport that captures the assembled message.

use std::path::Path;
use std::sync::Mutex;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::Message;
use logbook_db::models::entry::CreateEntry;
use logbook_db::models::media::CreateMedia;
use logbook_db::repositories::EntryRepo;
use logbook_digest::config::DigestConfig;
use logbook_digest::email::{EmailError, MailTransport};
use logbook_digest::job::{run_weekly_digest, DigestContext, DigestOutcome};
use sqlx::SqlitePool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CapturingTransport {
    sent: Mutex<Vec<Message>>,
}

impl CapturingTransport {
    fn raw_messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| String::from_utf8_lossy(&m.formatted()).into_owned())
            .collect()
    }
}

#[async_trait]
impl MailTransport for CapturingTransport {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

struct FailingTransport;

#[async_trait]
impl MailTransport for FailingTransport {
    async fn send(&self, _message: Message) -> Result<(), EmailError> {
        Err(EmailError::Timeout(30))
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn config(upload_dir: &Path, temp_dir: &Path) -> DigestConfig {
    DigestConfig {
        upload_dir: upload_dir.to_path_buf(),
        window_days: 7,
        max_inline_image_bytes: 1024,
        cloud_storage_base_url: "https://cdn.example.com/".to_string(),
        sender: "logbook@example.com".to_string(),
        recipient: "me@example.com".to_string(),
        temp_dir: temp_dir.to_path_buf(),
    }
}

async fn add_entry(pool: &SqlitePool, day: &str, title: &str, media: &[(&str, bool)]) {
    let entry = CreateEntry {
        date: date(day),
        title: Some(title.to_string()),
        description: format!("{title} happened"),
    };
    let media: Vec<_> = media
        .iter()
        .map(|(name, is_video)| CreateMedia {
            media_path: format!("uploads/{name}"),
            is_video: *is_video,
        })
        .collect();
    EntryRepo::create_with_media(pool, &entry, &media)
        .await
        .unwrap();
}

/// Undo quoted-printable soft line breaks and `=` escapes so long HTML lines
/// can be searched.
fn unfold_quoted_printable(raw: &str) -> String {
    raw.replace("=\r\n", "").replace("=3D", "=")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_window_sends_nothing(pool: SqlitePool) {
    let uploads = tempfile::tempdir().unwrap();
    add_entry(&pool, "2023-12-31", "Too old", &[("old.png", false)]).await;
    add_entry(&pool, "2024-01-09", "Too new", &[("new.png", false)]).await;

    let ctx = DigestContext {
        pool,
        config: config(uploads.path(), uploads.path()),
    };
    let transport = CapturingTransport::default();

    let outcome = run_weekly_digest(&ctx, &transport, date("2024-01-08"))
        .await
        .unwrap();
    assert_eq!(outcome, DigestOutcome::Skipped);
    assert!(transport.raw_messages().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn digest_embeds_small_images_and_links_the_rest(pool: SqlitePool) {
    let uploads = tempfile::tempdir().unwrap();
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(uploads.path().join("small.png"), vec![1u8; 100]).unwrap();
    std::fs::write(uploads.path().join("large.jpg"), vec![2u8; 4096]).unwrap();
    std::fs::write(uploads.path().join("clip.mp4"), vec![3u8; 10]).unwrap();

    add_entry(&pool, "2024-01-01", "Start", &[("small.png", false)]).await;
    add_entry(
        &pool,
        "2024-01-08",
        "End",
        &[("large.jpg", false), ("clip.mp4", true), ("missing.png", false)],
    )
    .await;
    add_entry(&pool, "2023-12-31", "Outside", &[("outside.png", false)]).await;

    let ctx = DigestContext {
        pool,
        config: config(uploads.path(), temp.path()),
    };
    let transport = CapturingTransport::default();

    let outcome = run_weekly_digest(&ctx, &transport, date("2024-01-08"))
        .await
        .unwrap();
    assert_eq!(outcome, DigestOutcome::Sent);

    let messages = transport.raw_messages();
    assert_eq!(messages.len(), 1);
    let raw = &messages[0];

    assert!(raw.contains("Subject: Weekly Log Summary: 2024-01-01 to 2024-01-08"));
    assert!(raw.contains("To: me@example.com"));
    assert!(raw.contains("multipart/related"));

    // Only the small image is attached.
    assert_eq!(raw.matches("Content-ID:").count(), 1);
    assert!(raw.contains("Content-ID: <small.png>"));
    assert!(!raw.contains("Content-ID: <large.jpg>"));
    assert!(!raw.contains("Content-ID: <clip.mp4>"));

    // The rest is linked from the body instead.
    let body = unfold_quoted_printable(raw);
    assert!(body.contains("cid:small.png"));
    assert!(body.contains("https://cdn.example.com/large.jpg"));
    assert!(body.contains("https://cdn.example.com/clip.mp4"));
    assert!(!body.contains("https://cdn.example.com/small.png"));

    // Nothing was left behind in the temp directory.
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn transport_failure_is_reported_not_raised(pool: SqlitePool) {
    let uploads = tempfile::tempdir().unwrap();
    std::fs::write(uploads.path().join("a.png"), vec![1u8; 10]).unwrap();
    add_entry(&pool, "2024-01-05", "Mid", &[("a.png", false)]).await;

    let ctx = DigestContext {
        pool,
        config: config(uploads.path(), uploads.path()),
    };

    let outcome = run_weekly_digest(&ctx, &FailingTransport, date("2024-01-08")).await;
    assert_matches!(outcome, Ok(DigestOutcome::Failed));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bad_recipient_is_an_error(pool: SqlitePool) {
    let uploads = tempfile::tempdir().unwrap();
    add_entry(&pool, "2024-01-05", "Mid", &[("a.png", false)]).await;

    let mut config = config(uploads.path(), uploads.path());
    config.recipient = "nobody".to_string();
    let ctx = DigestContext { pool, config };

    let outcome = run_weekly_digest(&ctx, &CapturingTransport::default(), date("2024-01-08")).await;
    assert!(outcome.is_err());
}
