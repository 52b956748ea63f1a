//! Gallery entry management
//!
//! The service facade ties the payload parser, entry validator, and entry
//! store together: parse the submitted JSON, validate the whole list, and
//! only then replace the block's persisted entry set.

pub mod choices;
pub mod payload;
pub mod store;
pub mod validate;

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::warn;

use crate::files::FileService;
use crate::permissions::{Actor, PermissionChecker};
use crate::Result;
pub use choices::{ChoiceValidators, DisplayChoiceSchema};
pub use payload::{parse_entry_payload, EntrySubmission, PayloadError};
pub use store::{EntryStore, GalleryEntry};
pub use validate::{EntryValidator, ErrorList, ValidationIssue};

/// Result of a save request.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Entries validated and persisted
    Saved { count: usize },
    /// Payload was not a JSON array; nothing was validated or persisted
    Malformed,
    /// Validation failed; nothing was persisted
    Invalid(ErrorList),
}

/// Facade over parsing, validation, and persistence for gallery blocks.
pub struct GalleryService {
    validator: EntryValidator,
    store: EntryStore,
    schema: DisplayChoiceSchema,
}

impl GalleryService {
    pub fn new(
        db: SqlitePool,
        files: Arc<dyn FileService>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        let schema = DisplayChoiceSchema::standard();
        let validator = EntryValidator::new(
            files.clone(),
            permissions,
            schema.clone(),
            ChoiceValidators::standard(),
        );
        let store = EntryStore::new(db, files, schema.clone());

        Self {
            validator,
            store,
            schema,
        }
    }

    /// Parse, validate, and (only on success) persist the submitted entry
    /// list for a block.
    pub async fn save_entries(
        &self,
        block_id: i64,
        field_json: &str,
        actor: &Actor,
    ) -> Result<SaveOutcome> {
        let entries = match parse_entry_payload(field_json) {
            Ok(entries) => entries,
            Err(PayloadError::MalformedInput) => {
                warn!(block_id, "Rejected malformed gallery payload");
                return Ok(SaveOutcome::Malformed);
            }
        };

        let errors = self.validator.validate_entries(&entries, actor).await?;
        if !errors.is_empty() {
            warn!(
                block_id,
                issue_count = errors.len(),
                "Rejected gallery entries on validation"
            );
            return Ok(SaveOutcome::Invalid(errors));
        }

        let count = self.store.replace_entries(block_id, &entries).await?;
        Ok(SaveOutcome::Saved { count })
    }

    /// Hydrated entries for a block, ordered by position.
    pub async fn get_entries(&self, block_id: i64) -> Result<Vec<GalleryEntry>> {
        self.store.get_entries(block_id).await
    }

    /// The block type's display choice schema, for edit interfaces.
    pub fn schema(&self) -> &DisplayChoiceSchema {
        &self.schema
    }
}
