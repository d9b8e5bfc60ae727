use logbook_core::config::StorageConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for running on a single host.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5001`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `300`, large uploads are slow).
    pub request_timeout_secs: u64,
    /// Maximum accepted request body in bytes (default: 500 MiB).
    pub max_body_bytes: usize,
    /// Upload root and accepted extensions.
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5001`                     |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `MAX_BODY_BYTES`       | `524288000`                |
    ///
    /// Storage settings come from [`StorageConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5001".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_body_bytes: usize = std::env::var("MAX_BODY_BYTES")
            .unwrap_or_else(|_| (500 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_BODY_BYTES must be a valid usize");

        Self {
            host,
            port,
            request_timeout_secs,
            max_body_bytes,
            storage: StorageConfig::from_env(),
        }
    }
}
