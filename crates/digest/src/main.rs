use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logbook_digest::config::DigestConfig;
use logbook_digest::email::{EmailConfig, SmtpMailer};
use logbook_digest::job::{run_weekly_digest, DigestContext, DigestError, DigestOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logbook_digest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(DigestOutcome::Skipped | DigestOutcome::Sent) => ExitCode::SUCCESS,
        Ok(DigestOutcome::Failed) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Weekly digest failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<DigestOutcome, DigestError> {
    // --- Configuration ---
    let config = DigestConfig::from_env()?;
    let email = EmailConfig::from_env()
        .ok_or_else(|| DigestError::Config("SMTP_HOST must be set".into()))?;
    tracing::info!(
        recipient = %config.recipient,
        smtp_host = %email.smtp_host,
        upload_dir = %config.upload_dir.display(),
        "Loaded digest configuration"
    );
    let mailer = SmtpMailer::new(&email)?;

    // --- Database ---
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://logbook.db".into());
    let pool = logbook_db::create_pool(&database_url).await?;
    logbook_db::run_migrations(&pool).await?;

    let ctx = DigestContext { pool, config };
    let today = chrono::Local::now().date_naive();
    let outcome = run_weekly_digest(&ctx, &mailer, today).await;

    ctx.pool.close().await;
    outcome
}
