//! Repository for the `media` table.

use logbook_core::types::{DbId, EntryDate};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::media::{CreateMedia, Media};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, entry_id, media_path, is_video";

/// Media rows are only created alongside their entry and only removed with it.
pub struct MediaRepo;

impl MediaRepo {
    /// Insert one media row for `entry_id`.
    ///
    /// Takes any executor so it can run inside the entry's transaction.
    pub async fn create<'e, E>(
        executor: E,
        entry_id: DbId,
        input: &CreateMedia,
    ) -> Result<Media, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let query = format!(
            "INSERT INTO media (entry_id, media_path, is_video)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(entry_id)
            .bind(&input.media_path)
            .bind(input.is_video)
            .fetch_one(executor)
            .await
    }

    /// Media for one entry, in insertion order.
    pub async fn list_by_entry(pool: &SqlitePool, entry_id: DbId) -> Result<Vec<Media>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media WHERE entry_id = $1 ORDER BY id");
        sqlx::query_as::<_, Media>(&query)
            .bind(entry_id)
            .fetch_all(pool)
            .await
    }

    /// Every media row, grouped by entry and in insertion order within one.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Media>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media ORDER BY entry_id, id");
        sqlx::query_as::<_, Media>(&query).fetch_all(pool).await
    }

    /// Media of entries dated within `[start, end]` (inclusive).
    pub async fn list_for_date_range(
        pool: &SqlitePool,
        start: EntryDate,
        end: EntryDate,
    ) -> Result<Vec<Media>, sqlx::Error> {
        sqlx::query_as::<_, Media>(
            "SELECT m.id, m.entry_id, m.media_path, m.is_video
             FROM media m
             JOIN entry e ON e.id = m.entry_id
             WHERE e.date >= $1 AND e.date <= $2
             ORDER BY m.entry_id, m.id",
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
