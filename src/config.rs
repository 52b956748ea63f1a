//! Configuration loading and database path resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Base URL used when constructing thumbnail and detail-page links
    pub base_url: String,
}

impl ServiceConfig {
    /// Resolve the full service configuration from CLI arguments,
    /// applying the database path priority chain.
    pub fn resolve(database: Option<&str>, bind_address: String, base_url: String) -> Result<Self> {
        Ok(Self {
            database_path: resolve_database_path(database)?,
            bind_address,
            base_url,
        })
    }
}

/// Database path resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`GALLERY_DB`)
/// 3. TOML config file (`database_path` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_database_path(cli_arg: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("GALLERY_DB") {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(path) = config.get("database_path").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(path));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_database_path())
}

/// Locate the configuration file for the platform
fn locate_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("gallery-entries").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/gallery-entries/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Compiled default database location
fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gallery-entries")
        .join("gallery.db")
}
