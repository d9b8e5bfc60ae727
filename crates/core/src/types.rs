/// All database primary keys are SQLite INTEGER rowids.
pub type DbId = i64;

/// Entry dates are calendar days, persisted as `YYYY-MM-DD` text.
pub type EntryDate = chrono::NaiveDate;
