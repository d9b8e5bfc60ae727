//! Email delivery via SMTP.
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport (EHLO, STARTTLS,
//! EHLO, AUTH, send, QUIT on every message). The job talks to it through the
//! [`MailTransport`] trait so tests can capture messages instead.

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::first_var;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The SMTP exchange did not finish in time.
    #[error("SMTP exchange timed out after {0}s")]
    Timeout(u64),
}

impl EmailError {
    /// The server rejected our credentials (SMTP 535).
    pub fn is_auth_failure(&self) -> bool {
        match self {
            EmailError::Transport(err) => err.status().is_some_and(|code| code.to_string() == "535"),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default per-exchange SMTP timeout in seconds.
const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;

/// Configuration for the SMTP transport.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
    pub timeout_secs: u64,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if neither `SMTP_HOST` nor `SMTP_SERVER` is set.
    ///
    /// | Variable            | Required | Fallback         | Default |
    /// |---------------------|----------|------------------|---------|
    /// | `SMTP_HOST`         | yes      | `SMTP_SERVER`    | —       |
    /// | `SMTP_PORT`         | no       | —                | `587`   |
    /// | `SMTP_USER`         | no       | `EMAIL_ADDRESS`  | —       |
    /// | `SMTP_PASSWORD`     | no       | `EMAIL_PASSWORD` | —       |
    /// | `SMTP_TIMEOUT_SECS` | no       | —                | `30`    |
    pub fn from_env() -> Option<Self> {
        let smtp_host = first_var(&["SMTP_HOST", "SMTP_SERVER"])?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            smtp_user: first_var(&["SMTP_USER", "EMAIL_ADDRESS"]),
            smtp_password: first_var(&["SMTP_PASSWORD", "EMAIL_PASSWORD"]),
            timeout_secs: std::env::var("SMTP_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(DEFAULT_SMTP_TIMEOUT_SECS),
        })
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Something that can send an assembled message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), EmailError>;
}

/// SMTP transport using STARTTLS and optional credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    timeout_secs: u64,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        // The transport timeout covers single reads and writes; this bounds
        // the whole exchange.
        let exchange = self.transport.send(message);
        match tokio::time::timeout(Duration::from_secs(self.timeout_secs), exchange).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(EmailError::Timeout(self.timeout_secs)),
        }
    }
}

/// Send `message`, logging the outcome. Never fails: returns whether the
/// message was accepted.
pub async fn deliver(transport: &dyn MailTransport, message: Message, recipient: &str) -> bool {
    match transport.send(message).await {
        Ok(()) => {
            tracing::info!(to = recipient, "Digest email sent");
            true
        }
        Err(e) if e.is_auth_failure() => {
            tracing::error!(
                to = recipient,
                error = %e,
                "SMTP authentication failed, check SMTP_USER and SMTP_PASSWORD"
            );
            false
        }
        Err(e) => {
            tracing::error!(to = recipient, error = %e, "Failed to send digest email");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusing;

    #[async_trait]
    impl MailTransport for Refusing {
        async fn send(&self, _message: Message) -> Result<(), EmailError> {
            Err(EmailError::Timeout(1))
        }
    }

    fn message() -> Message {
        Message::builder()
            .from("me@example.com".parse().unwrap())
            .to("you@example.com".parse().unwrap())
            .subject("hi")
            .body(String::from("body"))
            .unwrap()
    }

    #[tokio::test]
    async fn deliver_reports_failure_as_false() {
        assert!(!deliver(&Refusing, message(), "you@example.com").await);
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn email_error_display_address() {
        let addr_err: Result<lettre::Address, _> = "not-an-email".parse();
        let err = EmailError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[test]
    fn timeout_is_not_an_auth_failure() {
        assert!(!EmailError::Timeout(30).is_auth_failure());
    }
}
