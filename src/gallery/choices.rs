//! Display choice schema and type validators
//!
//! Display choices are the per-entry configuration options (cropping mode,
//! free-form options string) the edit interface offers for every image.
//! The schema is fixed in code per block type; persistence only ever stores
//! submitted values, never the schema itself.
//!
//! Validation dispatch is an explicit registry from the closed
//! [`ChoiceType`] enum to validator functions. A definition whose type has
//! no registered validator is an error, never a silent pass.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Closed set of display choice types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceType {
    Text,
    Select,
}

impl ChoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoiceType::Text => "text",
            ChoiceType::Select => "select",
        }
    }
}

/// Schema entry describing one configurable option.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayChoiceDefinition {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub choice_type: ChoiceType,
    /// Allowed option key → label pairs; only meaningful for `select`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl DisplayChoiceDefinition {
    pub fn text(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            choice_type: ChoiceType::Text,
            options: BTreeMap::new(),
        }
    }

    pub fn select(key: &str, title: &str, options: &[(&str, &str)]) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            choice_type: ChoiceType::Select,
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// One choice as it appears on a hydrated entry: the full definition plus
/// the persisted value (empty string when nothing was stored).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DisplayChoiceState {
    pub value: String,
    pub title: String,
    #[serde(rename = "type")]
    pub choice_type: ChoiceType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// The block type's fixed set of display choice definitions.
#[derive(Debug, Clone)]
pub struct DisplayChoiceSchema {
    definitions: Vec<DisplayChoiceDefinition>,
}

impl DisplayChoiceSchema {
    pub fn new(definitions: Vec<DisplayChoiceDefinition>) -> Self {
        Self { definitions }
    }

    /// The gallery block's standard option set.
    pub fn standard() -> Self {
        Self::new(vec![
            DisplayChoiceDefinition::text("gallery-specific-options", "Gallery Specific Options"),
            DisplayChoiceDefinition::select(
                "size",
                "Size",
                &[
                    ("square", "Square Image"),
                    ("default", "Keep Image Aspect Ratio"),
                ],
            ),
        ])
    }

    pub fn get(&self, key: &str) -> Option<&DisplayChoiceDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    pub fn definitions(&self) -> &[DisplayChoiceDefinition] {
        &self.definitions
    }

    /// Every key present with its definition and an empty value. The read
    /// path starts each entry from this and overlays persisted values.
    pub fn default_state(&self) -> BTreeMap<String, DisplayChoiceState> {
        self.definitions
            .iter()
            .map(|d| {
                (
                    d.key.clone(),
                    DisplayChoiceState {
                        value: String::new(),
                        title: d.title.clone(),
                        choice_type: d.choice_type,
                        options: d.options.clone(),
                    },
                )
            })
            .collect()
    }
}

/// A schema definition references a type with no registered validator.
#[derive(Debug, Error, PartialEq)]
#[error("Invalid choice type: {0}")]
pub struct UnsupportedChoiceType(pub String);

/// Validator signature: does `value` satisfy `definition`?
pub type ChoiceValidator = fn(&DisplayChoiceDefinition, &Value) -> bool;

/// Explicit type → validator mapping.
pub struct ChoiceValidators {
    validators: HashMap<ChoiceType, ChoiceValidator>,
}

impl ChoiceValidators {
    /// Registry with the validators for the standard choice types.
    pub fn standard() -> Self {
        let mut registry = Self {
            validators: HashMap::new(),
        };
        registry.register(ChoiceType::Text, validate_text);
        registry.register(ChoiceType::Select, validate_select);
        registry
    }

    /// Registry with no validators registered. New choice types must
    /// register a validator here or every submission of them fails.
    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    pub fn register(&mut self, choice_type: ChoiceType, validator: ChoiceValidator) {
        self.validators.insert(choice_type, validator);
    }

    /// Run the validator registered for the definition's type.
    ///
    /// `Ok(true)` - value accepted; `Ok(false)` - value rejected;
    /// `Err` - no validator registered for the type.
    pub fn check(
        &self,
        definition: &DisplayChoiceDefinition,
        value: &Value,
    ) -> Result<bool, UnsupportedChoiceType> {
        match self.validators.get(&definition.choice_type) {
            Some(validator) => Ok(validator(definition, value)),
            None => Err(UnsupportedChoiceType(
                definition.choice_type.as_str().to_string(),
            )),
        }
    }
}

/// Text choices accept any string value.
fn validate_text(_definition: &DisplayChoiceDefinition, value: &Value) -> bool {
    value.is_string()
}

/// Select choices accept one of the definition's option keys, or the empty
/// string meaning "unset".
fn validate_select(definition: &DisplayChoiceDefinition, value: &Value) -> bool {
    match value.as_str() {
        Some(s) => s.is_empty() || definition.options.contains_key(s),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn size_definition() -> DisplayChoiceDefinition {
        DisplayChoiceSchema::standard().get("size").unwrap().clone()
    }

    #[test]
    fn standard_schema_has_expected_keys() {
        let schema = DisplayChoiceSchema::standard();
        assert!(schema.get("gallery-specific-options").is_some());
        assert!(schema.get("size").is_some());
        assert!(schema.get("nonsense").is_none());
    }

    #[test]
    fn default_state_has_all_keys_empty() {
        let state = DisplayChoiceSchema::standard().default_state();
        assert_eq!(state.len(), 2);
        assert_eq!(state["size"].value, "");
        assert_eq!(state["size"].options["square"], "Square Image");
        assert_eq!(state["gallery-specific-options"].value, "");
    }

    #[test]
    fn text_accepts_strings_only() {
        let registry = ChoiceValidators::standard();
        let def = DisplayChoiceDefinition::text("caption", "Caption");

        assert_eq!(registry.check(&def, &json!("hello")).unwrap(), true);
        assert_eq!(registry.check(&def, &json!("")).unwrap(), true);
        assert_eq!(registry.check(&def, &json!(42)).unwrap(), false);
        assert_eq!(registry.check(&def, &Value::Null).unwrap(), false);
    }

    #[test]
    fn select_accepts_option_keys_or_empty() {
        let registry = ChoiceValidators::standard();
        let def = size_definition();

        assert_eq!(registry.check(&def, &json!("square")).unwrap(), true);
        assert_eq!(registry.check(&def, &json!("default")).unwrap(), true);
        assert_eq!(registry.check(&def, &json!("")).unwrap(), true);
        assert_eq!(registry.check(&def, &json!("triangle")).unwrap(), false);
        assert_eq!(registry.check(&def, &json!(1)).unwrap(), false);
    }

    #[test]
    fn unregistered_type_is_an_error() {
        let registry = ChoiceValidators::empty();
        let def = size_definition();

        let err = registry.check(&def, &json!("square")).unwrap_err();
        assert_eq!(err, UnsupportedChoiceType("select".to_string()));
    }
}
