//! Logbook web server library.
//!
//! Exposes config, state, error handling, the submission workflow and the
//! router so integration tests and the binary entrypoint share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
pub mod submission;
pub mod views;
