/// Domain errors shared by the API server and the digest job.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A file could not be decoded, converted or written.
    #[error("File processing error: {0}")]
    Processing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
