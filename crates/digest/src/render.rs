use askama::Template;

use crate::plan::{DigestEntry, DigestPlan};

/// HTML body of the weekly digest email.
#[derive(Template)]
#[template(path = "weekly_email.html")]
pub struct WeeklyEmail<'a> {
    pub entries: &'a [DigestEntry],
    pub start_date: String,
    pub end_date: String,
}

pub fn render_weekly_email(plan: &DigestPlan) -> Result<String, askama::Error> {
    WeeklyEmail {
        entries: &plan.entries,
        start_date: plan.window.start.to_string(),
        end_date: plan.window.end.to_string(),
    }
    .render()
}
