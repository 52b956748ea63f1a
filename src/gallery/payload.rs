//! Entry list payload parsing
//!
//! The edit interface submits the whole entry list as one JSON-encoded
//! array in the `field_json` field. Parsing is strict about the outer
//! shape (must be a JSON array of objects) and deliberately loose about
//! the inner values, which stay untyped until the validator inspects them.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One submitted entry, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySubmission {
    /// Referenced file id. Missing or non-numeric `id` fields parse as 0
    /// and are rejected by the validator, not the parser.
    pub file_id: i64,
    /// Submitted display-choice values keyed by choice key. Values are kept
    /// untyped; the type-specific validators decide what is acceptable.
    pub display_choices: BTreeMap<String, Value>,
}

/// Payload-level failure. Aborts validation with a single generic message.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("Invalid request.")]
    MalformedInput,
}

/// Parse the raw `field_json` string into an ordered entry list.
///
/// Fails with [`PayloadError::MalformedInput`] when the trimmed string is
/// empty, does not begin with `[`, does not parse as a JSON array, or
/// contains an element that is not an object.
pub fn parse_entry_payload(raw: &str) -> Result<Vec<EntrySubmission>, PayloadError> {
    let json = raw.trim();

    if json.is_empty() || !json.starts_with('[') {
        return Err(PayloadError::MalformedInput);
    }

    let data: Value = serde_json::from_str(json).map_err(|_| PayloadError::MalformedInput)?;
    let items = match data {
        Value::Array(items) => items,
        _ => return Err(PayloadError::MalformedInput),
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let obj = match item {
            Value::Object(obj) => obj,
            _ => return Err(PayloadError::MalformedInput),
        };

        let file_id = obj.get("id").and_then(Value::as_i64).unwrap_or(0);

        let mut display_choices = BTreeMap::new();
        if let Some(Value::Object(choices)) = obj.get("displayChoices") {
            for (key, choice) in choices {
                // Each choice is expected as {"value": ...}; anything else
                // surfaces as a null value for the validator to reject.
                let value = choice.get("value").cloned().unwrap_or(Value::Null);
                display_choices.insert(key.clone(), value);
            }
        }

        entries.push(EntrySubmission {
            file_id,
            display_choices,
        });
    }

    Ok(entries)
}
