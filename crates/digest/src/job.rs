//! The weekly digest job.

use chrono::NaiveDate;
use logbook_db::repositories::EntryRepo;
use logbook_db::DbPool;

use crate::config::DigestConfig;
use crate::email::{deliver, EmailError, MailTransport};
use crate::message::{assemble, AssembledMessage, MessageSpec};
use crate::plan::DigestPlan;
use crate::render::render_weekly_email;
use crate::window::DigestWindow;

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Email(#[from] EmailError),
}

/// How a digest run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestOutcome {
    /// No entries in the window; nothing was sent.
    Skipped,
    Sent,
    /// The message was built but the transport did not accept it.
    Failed,
}

/// Everything a digest run reads from.
#[derive(Clone)]
pub struct DigestContext {
    pub pool: DbPool,
    pub config: DigestConfig,
}

/// Build and send the digest for the window ending `today`.
///
/// Transport failures are logged and reported as [`DigestOutcome::Failed`];
/// only database, template and message-assembly problems are errors.
pub async fn run_weekly_digest(
    ctx: &DigestContext,
    transport: &dyn MailTransport,
    today: NaiveDate,
) -> Result<DigestOutcome, DigestError> {
    let config = &ctx.config;
    let window = DigestWindow::trailing(today, config.window_days);

    let entries = EntryRepo::list_in_range_with_media(&ctx.pool, window.start, window.end).await?;
    if entries.is_empty() {
        tracing::info!(start = %window.start, end = %window.end, "No entries in window, digest skipped");
        return Ok(DigestOutcome::Skipped);
    }

    let plan = DigestPlan::build(
        window,
        &entries,
        &config.upload_dir,
        config.max_inline_image_bytes,
        &config.cloud_storage_base_url,
    );
    tracing::info!(
        start = %window.start,
        end = %window.end,
        entries = plan.entries.len(),
        media = plan.media_count(),
        "Generating weekly digest"
    );

    let html = render_weekly_email(&plan)?;
    let spec = MessageSpec {
        from: config.sender.clone(),
        to: config.recipient.clone(),
        subject: window.subject(),
        html,
        max_inline_bytes: config.max_inline_image_bytes,
        temp_dir: config.temp_dir.clone(),
    };
    let AssembledMessage {
        message,
        embedded,
        temporaries,
    } = assemble(spec, plan.media().cloned().collect()).await?;
    tracing::debug!(embedded = embedded.len(), "Digest message assembled");

    let sent = deliver(transport, message, &config.recipient).await;
    // Compressed copies live exactly as long as the send attempt.
    drop(temporaries);

    Ok(if sent {
        DigestOutcome::Sent
    } else {
        DigestOutcome::Failed
    })
}
