//! Weekly digest: collects the trailing week's entries and mails them as an
//! HTML summary with small images inline and links to everything else.
//!
//! The `weekly-digest` binary runs [`job::run_weekly_digest`] once and exits;
//! scheduling is left to cron or a systemd timer.

pub mod config;
pub mod email;
pub mod job;
pub mod message;
pub mod plan;
pub mod render;
pub mod window;
