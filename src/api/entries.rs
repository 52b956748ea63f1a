//! Gallery entry HTTP handlers
//!
//! One logical inbound operation - save the entry list for a block - plus
//! the read path and the choice-schema endpoint used by edit interfaces.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::gallery::SaveOutcome;
use crate::permissions::Actor;
use crate::{AppState, Error};

/// Save request body. The entry list arrives as one JSON-encoded string,
/// the way the block edit form submits it. An omitted field means an
/// empty list, which clears the block.
#[derive(Debug, Deserialize)]
pub struct SaveEntriesRequest {
    #[serde(default = "default_field_json")]
    pub field_json: String,
}

fn default_field_json() -> String {
    "[]".to_string()
}

/// Resolve the acting user from the `x-user-id` header. Absent or
/// unparseable values mean an anonymous actor.
fn actor_from_headers(headers: &HeaderMap) -> Actor {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .map(Actor::user)
        .unwrap_or_else(Actor::anonymous)
}

/// PUT /api/blocks/:block_id/entries
///
/// Validates the submitted entry list and, only when it is fully valid,
/// replaces the block's persisted entries.
pub async fn save_entries(
    State(state): State<AppState>,
    Path(block_id): Path<i64>,
    headers: HeaderMap,
    Json(request): Json<SaveEntriesRequest>,
) -> Result<Json<serde_json::Value>, EntriesError> {
    let actor = actor_from_headers(&headers);

    let outcome = state
        .gallery
        .save_entries(block_id, &request.field_json, &actor)
        .await?;

    match outcome {
        SaveOutcome::Saved { count } => Ok(Json(json!({ "saved": count }))),
        SaveOutcome::Malformed => Err(EntriesError::Malformed),
        SaveOutcome::Invalid(errors) => Err(EntriesError::Invalid(errors.messages())),
    }
}

/// GET /api/blocks/:block_id/entries
///
/// Hydrated entries in position order. A referenced file that no longer
/// exists fails the whole read.
pub async fn get_entries(
    State(state): State<AppState>,
    Path(block_id): Path<i64>,
) -> Result<Json<serde_json::Value>, EntriesError> {
    let entries = state.gallery.get_entries(block_id).await?;
    Ok(Json(json!({ "entries": entries })))
}

/// GET /api/blocks/:block_id/choices
///
/// The block type's full display choice schema (all keys, empty values),
/// for rendering the option controls in an edit interface.
pub async fn get_choices(
    State(state): State<AppState>,
    Path(_block_id): Path<i64>,
) -> Json<serde_json::Value> {
    Json(json!({ "displayChoices": state.gallery.schema().default_state() }))
}

/// Handler-level errors
#[derive(Debug)]
pub enum EntriesError {
    /// Payload was not a JSON array
    Malformed,
    /// Validation failed; messages are user-facing
    Invalid(Vec<String>),
    /// Referenced file vanished, database failure, etc.
    Internal(String),
}

impl From<Error> for EntriesError {
    fn from(err: Error) -> Self {
        EntriesError::Internal(err.to_string())
    }
}

impl IntoResponse for EntriesError {
    fn into_response(self) -> Response {
        match self {
            EntriesError::Malformed => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request." })),
            )
                .into_response(),
            EntriesError::Invalid(messages) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": messages })),
            )
                .into_response(),
            EntriesError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}
