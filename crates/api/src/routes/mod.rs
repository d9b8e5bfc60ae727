pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the page routes.
///
/// ```text
/// /                  entry list
/// /new-entry         form (GET), submit (POST)
/// /entry-success     acknowledgement
/// ```
///
/// Stored media under `/uploads` is mounted by the router as a static
/// file service.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::entries::index))
        .route(
            "/new-entry",
            get(handlers::entries::new_entry_form).post(handlers::entries::create_entry),
        )
        .route("/entry-success", get(handlers::entries::entry_success))
}
