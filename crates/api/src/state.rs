use std::sync::Arc;

use logbook_core::ingest::MediaIngestor;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference counted and everything else sits
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: logbook_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Writes uploads under the configured upload root.
    pub ingestor: Arc<MediaIngestor>,
}

impl AppState {
    pub fn new(pool: logbook_db::DbPool, config: ServerConfig) -> Self {
        let ingestor = Arc::new(MediaIngestor::new(&config.storage));
        Self {
            pool,
            config: Arc::new(config),
            ingestor,
        }
    }
}
