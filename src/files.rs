//! File metadata service
//!
//! Gallery entries reference files by id; everything known about a file
//! (title, MIME type, attributes, size) lives behind the `FileService`
//! seam. The database, URL resolver, and size formatter are injected at
//! construction rather than resolved from ambient state.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::human_size::format_size;
use crate::urls::UrlResolver;
use crate::Result;

/// A file row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    pub file_id: i64,
    pub title: String,
    pub description: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub protected: bool,
}

/// Display metadata attached to each hydrated gallery entry
#[derive(Debug, Clone, Serialize)]
pub struct FileDetails {
    pub title: String,
    pub description: String,
    pub mime_type: String,
    /// (attribute display name, display value) pairs
    pub attributes: Vec<(String, String)>,
    pub file_size: String,
    pub image_url: String,
    pub thumb_url: String,
    pub detail_url: String,
}

/// Resolves file ids and produces display metadata
#[async_trait]
pub trait FileService: Send + Sync {
    /// Look up a file by id. `None` when no such file exists.
    async fn resolve(&self, file_id: i64) -> Result<Option<FileRecord>>;

    /// Build the display metadata for a resolved file.
    async fn display_metadata(&self, file: &FileRecord) -> Result<FileDetails>;
}

/// SQLite-backed file service
pub struct DbFileService {
    db: SqlitePool,
    urls: UrlResolver,
}

impl DbFileService {
    pub fn new(db: SqlitePool, urls: UrlResolver) -> Self {
        Self { db, urls }
    }
}

#[async_trait]
impl FileService for DbFileService {
    async fn resolve(&self, file_id: i64) -> Result<Option<FileRecord>> {
        let record = sqlx::query_as::<_, FileRecord>(
            "SELECT file_id, title, description, mime_type, size_bytes, protected
             FROM files WHERE file_id = ?",
        )
        .bind(file_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(record)
    }

    async fn display_metadata(&self, file: &FileRecord) -> Result<FileDetails> {
        let attributes: Vec<(String, String)> = sqlx::query_as(
            "SELECT name, value FROM file_attributes WHERE file_id = ? ORDER BY rowid",
        )
        .bind(file.file_id)
        .fetch_all(&self.db)
        .await?;

        Ok(FileDetails {
            title: file.title.clone(),
            description: file.description.clone(),
            mime_type: file.mime_type.clone(),
            attributes,
            file_size: format_size(file.size_bytes.max(0) as u64),
            image_url: self.urls.detail_thumbnail(file.file_id),
            thumb_url: self.urls.listing_thumbnail(file.file_id),
            detail_url: self.urls.detail_page(file.file_id),
        })
    }
}
