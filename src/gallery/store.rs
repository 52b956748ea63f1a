//! Entry persistence and reconstruction
//!
//! Saving is a wholesale replace: inside one transaction the block's
//! previous entry and display-choice rows are deleted, then the submitted
//! list is inserted with `position` assigned from list order. A concurrent
//! reader sees either the complete old set or the complete new one.
//!
//! Reading is a single outer-join query ordered by position, regrouped
//! row-by-row into entries: an accumulator keyed on entry id is emitted
//! whenever the id changes, and once more after the rows run out. Each
//! emitted entry starts from the full choice schema (every key present,
//! empty value), overlays persisted values, and is enriched with file
//! display metadata.

use async_stream::try_stream;
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::files::{FileDetails, FileService};
use crate::gallery::choices::{DisplayChoiceSchema, DisplayChoiceState};
use crate::gallery::payload::EntrySubmission;
use crate::{Error, Result};

/// A fully hydrated gallery entry, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryEntry {
    pub entry_id: i64,
    /// Referenced file id (wire name `id`, matching the submission shape)
    pub id: i64,
    pub position: i64,
    #[serde(flatten)]
    pub file: FileDetails,
    #[serde(rename = "displayChoices")]
    pub display_choices: BTreeMap<String, DisplayChoiceState>,
}

/// One row of the outer-join read query. `choice_key`/`value` are NULL for
/// entries without any persisted display choices.
#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    entry_id: i64,
    position: i64,
    file_id: i64,
    choice_key: Option<String>,
    value: Option<String>,
}

/// In-progress entry while scanning join rows.
struct EntryAccumulator {
    entry_id: i64,
    position: i64,
    file_id: i64,
    choices: BTreeMap<String, DisplayChoiceState>,
}

impl EntryAccumulator {
    fn start(row: &EntryRow, choices: BTreeMap<String, DisplayChoiceState>) -> Self {
        Self {
            entry_id: row.entry_id,
            position: row.position,
            file_id: row.file_id,
            choices,
        }
    }

    /// Overlay a persisted value. Keys that no longer exist in the schema
    /// are dropped silently (schema-evolution tolerance).
    fn overlay(&mut self, key: &str, value: String) {
        if let Some(state) = self.choices.get_mut(key) {
            state.value = value;
        }
    }
}

/// Persistence and reconstruction for gallery entries.
pub struct EntryStore {
    db: SqlitePool,
    files: Arc<dyn FileService>,
    schema: DisplayChoiceSchema,
}

impl EntryStore {
    pub fn new(db: SqlitePool, files: Arc<dyn FileService>, schema: DisplayChoiceSchema) -> Self {
        Self { db, files, schema }
    }

    /// Atomically replace the block's entry set with the submitted list.
    ///
    /// An empty list clears the block. No partial state is ever visible:
    /// the delete-then-insert sequence runs in one transaction.
    pub async fn replace_entries(
        &self,
        block_id: i64,
        entries: &[EntrySubmission],
    ) -> Result<usize> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "DELETE FROM gallery_entry_display_choices
             WHERE entry_id IN (SELECT entry_id FROM gallery_entries WHERE block_id = ?)",
        )
        .bind(block_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM gallery_entries WHERE block_id = ?")
            .bind(block_id)
            .execute(&mut *tx)
            .await?;

        for (position, entry) in entries.iter().enumerate() {
            let result = sqlx::query(
                "INSERT INTO gallery_entries (block_id, position, file_id) VALUES (?, ?, ?)",
            )
            .bind(block_id)
            .bind(position as i64)
            .bind(entry.file_id)
            .execute(&mut *tx)
            .await?;

            let entry_id = result.last_insert_rowid();

            // Only non-empty submitted values get a row; absence means
            // default/empty on read.
            for (key, value) in &entry.display_choices {
                if let Some(s) = value.as_str() {
                    if !s.is_empty() {
                        sqlx::query(
                            "INSERT INTO gallery_entry_display_choices
                             (entry_id, block_id, choice_key, value)
                             VALUES (?, ?, ?, ?)",
                        )
                        .bind(entry_id)
                        .bind(block_id)
                        .bind(key)
                        .bind(s)
                        .execute(&mut *tx)
                        .await?;
                    }
                }
            }
        }

        tx.commit().await?;

        info!(
            block_id,
            entry_count = entries.len(),
            "Replaced gallery entries"
        );

        Ok(entries.len())
    }

    /// Lazy, finite, non-restartable sequence of hydrated entries ordered
    /// by position. Fails if a referenced file no longer resolves.
    pub fn stream_entries(&self, block_id: i64) -> impl Stream<Item = Result<GalleryEntry>> + '_ {
        try_stream! {
            let rows: Vec<EntryRow> = sqlx::query_as(
                "SELECT e.entry_id, e.position, e.file_id, o.choice_key, o.value
                 FROM gallery_entries e
                 LEFT JOIN gallery_entry_display_choices o ON o.entry_id = e.entry_id
                 WHERE e.block_id = ?
                 ORDER BY e.position",
            )
            .bind(block_id)
            .fetch_all(&self.db)
            .await
            .map_err(Error::from)?;

            let mut current: Option<EntryAccumulator> = None;

            for row in rows {
                let starts_new_entry = current
                    .as_ref()
                    .map(|acc| acc.entry_id != row.entry_id)
                    .unwrap_or(true);

                if starts_new_entry {
                    if let Some(finished) = current.take() {
                        yield self.hydrate(finished).await?;
                    }
                    current = Some(EntryAccumulator::start(&row, self.schema.default_state()));
                }

                if let (Some(key), Some(value)) = (row.choice_key, row.value) {
                    if let Some(acc) = current.as_mut() {
                        acc.overlay(&key, value);
                    }
                }
            }

            if let Some(finished) = current.take() {
                yield self.hydrate(finished).await?;
            }
        }
    }

    /// Collect the reconstruction stream for handlers.
    pub async fn get_entries(&self, block_id: i64) -> Result<Vec<GalleryEntry>> {
        let entries: Vec<GalleryEntry> = self.stream_entries(block_id).try_collect().await?;
        debug!(block_id, entry_count = entries.len(), "Loaded gallery entries");
        Ok(entries)
    }

    async fn hydrate(&self, acc: EntryAccumulator) -> Result<GalleryEntry> {
        // A file deleted after save is fatal for the read
        let file = self.files.resolve(acc.file_id).await?.ok_or_else(|| {
            Error::NotFound(format!(
                "File {} referenced by gallery entry {}",
                acc.file_id, acc.entry_id
            ))
        })?;
        let details = self.files.display_metadata(&file).await?;

        Ok(GalleryEntry {
            entry_id: acc.entry_id,
            id: acc.file_id,
            position: acc.position,
            file: details,
            display_choices: acc.choices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::files::DbFileService;
    use crate::gallery::payload::parse_entry_payload;
    use crate::urls::UrlResolver;

    async fn seed_file(pool: &SqlitePool, title: &str) -> i64 {
        sqlx::query(
            "INSERT INTO files (title, mime_type, size_bytes) VALUES (?, 'image/png', 2048)",
        )
        .bind(title)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn store(pool: &SqlitePool) -> EntryStore {
        let files = Arc::new(DbFileService::new(
            pool.clone(),
            UrlResolver::new("http://localhost"),
        ));
        EntryStore::new(pool.clone(), files, DisplayChoiceSchema::standard())
    }

    #[tokio::test]
    async fn save_then_load_round_trips_order_and_file_ids() {
        let pool = init_memory_database().await.unwrap();
        let a = seed_file(&pool, "a").await;
        let b = seed_file(&pool, "b").await;
        let store = store(&pool).await;

        let raw = format!(r#"[{{"id": {}}}, {{"id": {}}}]"#, b, a);
        let entries = parse_entry_payload(&raw).unwrap();
        store.replace_entries(10, &entries).await.unwrap();

        let loaded = store.get_entries(10).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, b);
        assert_eq!(loaded[0].position, 0);
        assert_eq!(loaded[1].id, a);
        assert_eq!(loaded[1].position, 1);
    }

    #[tokio::test]
    async fn persisted_choice_values_overlay_defaults() {
        let pool = init_memory_database().await.unwrap();
        let file_id = seed_file(&pool, "a").await;
        let store = store(&pool).await;

        let raw = format!(
            r#"[{{"id": {}, "displayChoices": {{"size": {{"value": "square"}}}}}}]"#,
            file_id
        );
        let entries = parse_entry_payload(&raw).unwrap();
        store.replace_entries(10, &entries).await.unwrap();

        let loaded = store.get_entries(10).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].display_choices["size"].value, "square");
        // Unsubmitted keys are present with empty default values
        assert_eq!(
            loaded[0].display_choices["gallery-specific-options"].value,
            ""
        );
    }

    #[tokio::test]
    async fn empty_values_are_not_persisted() {
        let pool = init_memory_database().await.unwrap();
        let file_id = seed_file(&pool, "a").await;
        let store = store(&pool).await;

        let raw = format!(
            r#"[{{"id": {}, "displayChoices": {{"size": {{"value": ""}}}}}}]"#,
            file_id
        );
        let entries = parse_entry_payload(&raw).unwrap();
        store.replace_entries(10, &entries).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gallery_entry_display_choices")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn empty_list_clears_the_block() {
        let pool = init_memory_database().await.unwrap();
        let file_id = seed_file(&pool, "a").await;
        let store = store(&pool).await;

        let raw = format!(
            r#"[{{"id": {}, "displayChoices": {{"size": {{"value": "square"}}}}}}]"#,
            file_id
        );
        store
            .replace_entries(10, &parse_entry_payload(&raw).unwrap())
            .await
            .unwrap();
        store.replace_entries(10, &[]).await.unwrap();

        assert!(store.get_entries(10).await.unwrap().is_empty());

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gallery_entry_display_choices")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn replace_only_touches_the_given_block() {
        let pool = init_memory_database().await.unwrap();
        let file_id = seed_file(&pool, "a").await;
        let store = store(&pool).await;

        let raw = format!(r#"[{{"id": {}}}]"#, file_id);
        let entries = parse_entry_payload(&raw).unwrap();
        store.replace_entries(10, &entries).await.unwrap();
        store.replace_entries(11, &entries).await.unwrap();
        store.replace_entries(10, &[]).await.unwrap();

        assert!(store.get_entries(10).await.unwrap().is_empty());
        assert_eq!(store.get_entries(11).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_file_ids_persist_as_distinct_entries() {
        let pool = init_memory_database().await.unwrap();
        let file_id = seed_file(&pool, "a").await;
        let store = store(&pool).await;

        let raw = format!(
            r#"[{{"id": {id}, "displayChoices": {{"size": {{"value": "square"}}}}}},
                {{"id": {id}, "displayChoices": {{"size": {{"value": "default"}}}}}}]"#,
            id = file_id
        );
        let entries = parse_entry_payload(&raw).unwrap();
        store.replace_entries(10, &entries).await.unwrap();

        let loaded = store.get_entries(10).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_ne!(loaded[0].entry_id, loaded[1].entry_id);
        assert_eq!(loaded[0].position, 0);
        assert_eq!(loaded[1].position, 1);
        // Each entry keeps its own choice values
        assert_eq!(loaded[0].display_choices["size"].value, "square");
        assert_eq!(loaded[1].display_choices["size"].value, "default");
    }

    #[tokio::test]
    async fn stale_persisted_keys_are_dropped_on_read() {
        let pool = init_memory_database().await.unwrap();
        let file_id = seed_file(&pool, "a").await;
        let store = store(&pool).await;

        let raw = format!(r#"[{{"id": {}}}]"#, file_id);
        store
            .replace_entries(10, &parse_entry_payload(&raw).unwrap())
            .await
            .unwrap();

        // Simulate a value persisted under a schema that no longer has the key
        let entry_id: i64 = sqlx::query_scalar("SELECT entry_id FROM gallery_entries")
            .fetch_one(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO gallery_entry_display_choices (entry_id, block_id, choice_key, value)
             VALUES (?, 10, 'retired-option', 'x')",
        )
        .bind(entry_id)
        .execute(&pool)
        .await
        .unwrap();

        let loaded = store.get_entries(10).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].display_choices.contains_key("retired-option"));
    }

    #[tokio::test]
    async fn missing_file_is_fatal_for_the_read() {
        let pool = init_memory_database().await.unwrap();
        let file_id = seed_file(&pool, "a").await;
        let store = store(&pool).await;

        let raw = format!(r#"[{{"id": {}}}]"#, file_id);
        store
            .replace_entries(10, &parse_entry_payload(&raw).unwrap())
            .await
            .unwrap();

        // Delete the file after save
        sqlx::query("DELETE FROM files WHERE file_id = ?")
            .bind(file_id)
            .execute(&pool)
            .await
            .unwrap();

        let result = store.get_entries(10).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn hydrated_entries_carry_file_metadata() {
        let pool = init_memory_database().await.unwrap();
        let file_id = seed_file(&pool, "Sunset").await;
        let store = store(&pool).await;

        let raw = format!(r#"[{{"id": {}}}]"#, file_id);
        store
            .replace_entries(10, &parse_entry_payload(&raw).unwrap())
            .await
            .unwrap();

        let loaded = store.get_entries(10).await.unwrap();
        let entry = &loaded[0];
        assert_eq!(entry.file.title, "Sunset");
        assert_eq!(entry.file.mime_type, "image/png");
        assert_eq!(entry.file.file_size, "2.0 KB");
        assert!(entry.file.image_url.contains("/thumbnails/detail"));
        assert!(entry.file.thumb_url.contains("/thumbnails/listing"));
        assert!(entry.file.detail_url.contains("/dashboard/files/details/view/"));
    }
}
