use chrono::{Duration, NaiveDate};

/// Inclusive range of entry dates covered by one digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DigestWindow {
    /// `days` days back from `today`, plus today itself.
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        Self {
            start: today - Duration::days(days),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn subject(&self) -> String {
        format!("Weekly Log Summary: {} to {}", self.start, self.end)
    }
}
