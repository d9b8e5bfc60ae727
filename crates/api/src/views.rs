//! Server-rendered pages.

use askama::Template;
use axum::response::Html;
use logbook_db::models::entry::EntryWithMedia;

use crate::error::AppResult;

/// `GET /`: every entry, newest first, with its media.
#[derive(Template)]
#[template(path = "entries.html")]
pub struct EntriesPage<'a> {
    pub entries: &'a [EntryWithMedia],
}

/// `GET /new-entry`: the submission form.
#[derive(Template)]
#[template(path = "new_entry.html")]
pub struct NewEntryPage<'a> {
    pub files_field: &'a str,
}

/// `GET /entry-success`: acknowledgement after a submission.
#[derive(Template)]
#[template(path = "entry_success.html")]
pub struct EntrySuccessPage;

/// Render a template into an HTML response.
pub fn render<T: Template>(page: &T) -> AppResult<Html<String>> {
    Ok(Html(page.render()?))
}
