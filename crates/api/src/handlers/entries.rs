//! Handlers for listing and submitting journal entries.

use axum::extract::{Multipart, State};
use axum::response::{Html, Redirect};
use logbook_db::repositories::EntryRepo;

use crate::error::AppResult;
use crate::state::AppState;
use crate::submission::{self, SubmissionForm, FILES_FIELD};
use crate::views::{render, EntriesPage, EntrySuccessPage, NewEntryPage};

/// GET /
///
/// All entries, newest date first, each with its media.
pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let entries = EntryRepo::list_with_media(&state.pool).await?;
    render(&EntriesPage { entries: &entries })
}

/// GET /new-entry
pub async fn new_entry_form() -> AppResult<Html<String>> {
    render(&NewEntryPage {
        files_field: FILES_FIELD,
    })
}

/// POST /new-entry
///
/// Accepts a multipart form with an optional `title`, a required
/// `description` and one or more `photos` parts. Dated today in the server's
/// local calendar.
pub async fn create_entry(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Redirect> {
    let form = SubmissionForm::from_multipart(&mut multipart).await?;
    let today = chrono::Local::now().date_naive();

    submission::submit_entry(&state.pool, &state.ingestor, form, today).await?;
    Ok(Redirect::to("/entry-success"))
}

/// GET /entry-success
pub async fn entry_success() -> AppResult<Html<String>> {
    render(&EntrySuccessPage)
}
