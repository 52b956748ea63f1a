//! gallery-entries - Gallery block entry service
//!
//! Accepts JSON-encoded entry lists for gallery blocks, validates them
//! against the file store and display-choice schema, persists them with an
//! atomic replace, and serves hydrated entries back for rendering.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use gallery_entries::config::ServiceConfig;
use gallery_entries::{build_router, db, AppState};

#[derive(Debug, Parser)]
#[command(name = "gallery-entries", version, about)]
struct Args {
    /// Path to the SQLite database file
    #[arg(long, env = "GALLERY_DB")]
    database: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "GALLERY_BIND", default_value = "127.0.0.1:5780")]
    bind: String,

    /// Base URL used when constructing thumbnail and detail-page links
    #[arg(long, env = "GALLERY_BASE_URL", default_value = "http://127.0.0.1:5780")]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting gallery-entries v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let config = ServiceConfig::resolve(args.database.as_deref(), args.bind, args.base_url)?;
    info!("Database path: {}", config.database_path.display());

    let pool = match db::init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(pool, &config.base_url);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("gallery-entries listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
