//! Entry list validation
//!
//! Runs before any save is attempted. The whole list is checked in order,
//! stopping after the first entry that produced issues; issues within that
//! entry's choice map are all collected so the user sees every problem on
//! the offending entry at once.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::files::FileService;
use crate::gallery::choices::{ChoiceValidators, DisplayChoiceSchema};
use crate::gallery::payload::EntrySubmission;
use crate::permissions::{Actor, PermissionChecker};
use crate::Result;

/// One validation failure, user-facing via `Display`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationIssue {
    /// Zero, missing, or unresolvable file id
    #[error("Invalid file ID provided.")]
    InvalidReference { file_id: i64 },

    /// Actor lacks view capability for the referenced file
    #[error("File permission denied.")]
    PermissionDenied { file_id: i64 },

    /// Submitted choice key is not in the schema
    #[error("Invalid choice provided: {key} {value}")]
    UnknownChoice { key: String, value: String },

    /// Schema definition references a type with no registered validator
    #[error("Invalid choice type: {choice_type}")]
    UnsupportedChoiceType { choice_type: String },

    /// Value fails the type-specific rule
    #[error("Invalid choice provided: {key} {value}")]
    InvalidChoiceValue { key: String, value: String },
}

/// Accumulated validation failures for one submission.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ErrorList {
    issues: Vec<ValidationIssue>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Human-readable messages in occurrence order.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.to_string()).collect()
    }
}

/// Render a submitted value for inclusion in an error message.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Validates parsed entry lists against the file service, permission
/// checker, and display choice schema. All collaborators are injected at
/// construction.
pub struct EntryValidator {
    files: Arc<dyn FileService>,
    permissions: Arc<dyn PermissionChecker>,
    schema: DisplayChoiceSchema,
    validators: ChoiceValidators,
}

impl EntryValidator {
    pub fn new(
        files: Arc<dyn FileService>,
        permissions: Arc<dyn PermissionChecker>,
        schema: DisplayChoiceSchema,
        validators: ChoiceValidators,
    ) -> Self {
        Self {
            files,
            permissions,
            schema,
            validators,
        }
    }

    /// Validate the whole list in order. Entries after the first failing
    /// one are not checked.
    pub async fn validate_entries(
        &self,
        entries: &[EntrySubmission],
        actor: &Actor,
    ) -> Result<ErrorList> {
        let mut errors = ErrorList::new();

        for entry in entries {
            let before = errors.len();
            self.validate_entry(entry, actor, &mut errors).await?;
            if errors.len() != before {
                break;
            }
        }

        Ok(errors)
    }

    async fn validate_entry(
        &self,
        entry: &EntrySubmission,
        actor: &Actor,
        errors: &mut ErrorList,
    ) -> Result<()> {
        if entry.file_id == 0 {
            errors.push(ValidationIssue::InvalidReference {
                file_id: entry.file_id,
            });
            return Ok(());
        }

        let file = match self.files.resolve(entry.file_id).await? {
            Some(file) => file,
            None => {
                errors.push(ValidationIssue::InvalidReference {
                    file_id: entry.file_id,
                });
                return Ok(());
            }
        };

        if !self.permissions.can_view(actor, &file) {
            errors.push(ValidationIssue::PermissionDenied {
                file_id: entry.file_id,
            });
            return Ok(());
        }

        for (key, value) in &entry.display_choices {
            self.validate_display_choice(key, value, errors);
        }

        Ok(())
    }

    fn validate_display_choice(&self, key: &str, value: &Value, errors: &mut ErrorList) {
        let definition = match self.schema.get(key) {
            Some(definition) => definition,
            None => {
                errors.push(ValidationIssue::UnknownChoice {
                    key: key.to_string(),
                    value: render_value(value),
                });
                return;
            }
        };

        match self.validators.check(definition, value) {
            Err(unsupported) => errors.push(ValidationIssue::UnsupportedChoiceType {
                choice_type: unsupported.0,
            }),
            Ok(false) => errors.push(ValidationIssue::InvalidChoiceValue {
                key: key.to_string(),
                value: render_value(value),
            }),
            Ok(true) => {}
        }
    }
}
