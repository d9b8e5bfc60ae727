//! Domain core for the logbook: shared types and errors, upload filename
//! handling, media classification, image conversion and the ingestion step
//! that turns one uploaded file into a stored media file.

pub mod config;
pub mod error;
pub mod filename;
pub mod imaging;
pub mod ingest;
pub mod media;
pub mod types;
