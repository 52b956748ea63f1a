//! # Gallery Entry Service
//!
//! Stores, validates, and serves the ordered entry list of image-gallery
//! content blocks:
//! - JSON payload parsing and per-entry validation (file existence, view
//!   permission, display-choice schema conformance)
//! - Atomic replace persistence over SQLite
//! - Streaming reconstruction of hydrated entries for rendering

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod files;
pub mod gallery;
pub mod human_size;
pub mod permissions;
pub mod urls;

pub use error::{Error, Result};

use files::DbFileService;
use gallery::GalleryService;
use permissions::ProtectedFilePolicy;
use urls::UrlResolver;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Gallery service (parser + validator + store)
    pub gallery: Arc<GalleryService>,
}

impl AppState {
    /// Wire up the production collaborators: SQLite-backed file service,
    /// protected-file permission policy, and URL resolution rooted at
    /// `base_url`.
    pub fn new(db: SqlitePool, base_url: &str) -> Self {
        let files = Arc::new(DbFileService::new(db.clone(), UrlResolver::new(base_url)));
        let gallery = Arc::new(GalleryService::new(
            db.clone(),
            files,
            Arc::new(ProtectedFilePolicy),
        ));

        Self { db, gallery }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route(
            "/api/blocks/:block_id/entries",
            get(api::get_entries).put(api::save_entries),
        )
        .route("/api/blocks/:block_id/choices", get(api::get_choices))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
