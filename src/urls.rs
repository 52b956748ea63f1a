//! URL construction for file thumbnails and detail pages
//!
//! The resolver is constructed once at startup and passed into the file
//! service explicitly, rather than being looked up from ambient state.

/// Builds file-related URLs from a configured base.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    base: String,
}

impl UrlResolver {
    /// Create a resolver rooted at `base` (trailing slash is stripped).
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    /// URL of the large (detail view) thumbnail for a file.
    pub fn detail_thumbnail(&self, file_id: i64) -> String {
        format!("{}/files/{}/thumbnails/detail", self.base, file_id)
    }

    /// URL of the small (listing view) thumbnail for a file.
    pub fn listing_thumbnail(&self, file_id: i64) -> String {
        format!("{}/files/{}/thumbnails/listing", self.base, file_id)
    }

    /// URL of the file detail page.
    pub fn detail_page(&self, file_id: i64) -> String {
        format!("{}/dashboard/files/details/view/{}", self.base, file_id)
    }
}
