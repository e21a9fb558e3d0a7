//! JSON Schema validation for lookup data documents.
//!
//! Lookup files are checked against `data/lookup.schema.json` before they
//! are deserialized, so a malformed tariff file is reported field by field
//! instead of failing on the first serde error.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded lookup schema (loaded at compile time).
const LOOKUP_SCHEMA_JSON: &str = include_str!("../../data/lookup.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(LOOKUP_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a lookup document against the schema.
///
/// Returns every violation, each suffixed with its JSON pointer.
pub fn validate_lookup_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLED: &str = include_str!("../../data/lookup.yaml");

    fn bundled() -> serde_json::Value {
        serde_yaml::from_str(BUNDLED).unwrap()
    }

    #[test]
    fn test_bundled_data_passes_schema() {
        assert!(validate_lookup_schema(&bundled()).is_ok());
    }

    #[test]
    fn test_missing_section_fails() {
        let mut doc = bundled();
        doc.as_object_mut().unwrap().remove("underwriting");
        let errors = validate_lookup_schema(&doc).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unknown_underwriting_marker_fails() {
        let mut doc = bundled();
        doc["underwriting"]["heights"][0]["rows"][0][0] = serde_json::json!("МЕДО");
        assert!(validate_lookup_schema(&doc).is_err());
    }

    #[test]
    fn test_bank_without_aliases_fails() {
        let mut doc = bundled();
        doc["banks"][0]["aliases"] = serde_json::json!([]);
        let errors = validate_lookup_schema(&doc).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("/banks/0/aliases")));
    }

    #[test]
    fn test_additional_properties_fail() {
        let mut doc = bundled();
        doc["title"]["unexpected"] = serde_json::json!(1);
        assert!(validate_lookup_schema(&doc).is_err());
    }
}
