//! Repository for the `entry` table.

use std::collections::HashMap;

use logbook_core::types::{DbId, EntryDate};
use sqlx::SqlitePool;

use crate::models::entry::{CreateEntry, Entry, EntryWithMedia};
use crate::models::media::{CreateMedia, Media};
use crate::repositories::MediaRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, date, title, description";

/// Newest first; same-day entries newest-inserted first.
const ORDER: &str = "ORDER BY date DESC, id DESC";

pub struct EntryRepo;

impl EntryRepo {
    /// Insert an entry and all of its media in one transaction.
    ///
    /// Either every row is committed or none is.
    pub async fn create_with_media(
        pool: &SqlitePool,
        input: &CreateEntry,
        media: &[CreateMedia],
    ) -> Result<EntryWithMedia, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO entry (date, title, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let entry = sqlx::query_as::<_, Entry>(&query)
            .bind(input.date)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(media.len());
        for item in media {
            created.push(MediaRepo::create(&mut *tx, entry.id, item).await?);
        }

        tx.commit().await?;
        tracing::debug!(entry_id = entry.id, media_count = created.len(), "Entry created");

        Ok(EntryWithMedia {
            entry,
            media: created,
        })
    }

    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Entry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entry WHERE id = $1");
        sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All entries, newest first, each with its media.
    pub async fn list_with_media(pool: &SqlitePool) -> Result<Vec<EntryWithMedia>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entry {ORDER}");
        let entries = sqlx::query_as::<_, Entry>(&query).fetch_all(pool).await?;
        let media = MediaRepo::list_all(pool).await?;
        Ok(attach_media(entries, media))
    }

    /// Entries dated within `[start, end]` (both inclusive), newest first,
    /// each with its media.
    pub async fn list_in_range_with_media(
        pool: &SqlitePool,
        start: EntryDate,
        end: EntryDate,
    ) -> Result<Vec<EntryWithMedia>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entry WHERE date >= $1 AND date <= $2 {ORDER}");
        let entries = sqlx::query_as::<_, Entry>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await?;
        let media = MediaRepo::list_for_date_range(pool, start, end).await?;
        Ok(attach_media(entries, media))
    }

    /// Permanently delete an entry and its media. Returns `true` if the
    /// entry existed.
    ///
    /// Media rows are removed explicitly in the same transaction, so the
    /// result does not depend on the connection enforcing foreign keys.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM media WHERE entry_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM entry WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entry")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

/// Pair each entry with its media, keeping the entries' order and the
/// media's insertion order.
fn attach_media(entries: Vec<Entry>, media: Vec<Media>) -> Vec<EntryWithMedia> {
    let mut by_entry: HashMap<DbId, Vec<Media>> = HashMap::new();
    for item in media {
        by_entry.entry(item.entry_id).or_default().push(item);
    }

    entries
        .into_iter()
        .map(|entry| {
            let media = by_entry.remove(&entry.id).unwrap_or_default();
            EntryWithMedia { entry, media }
        })
        .collect()
}
