//! HTTP API handlers

pub mod entries;
pub mod health;

pub use entries::{get_choices, get_entries, save_entries};
pub use health::health_routes;
