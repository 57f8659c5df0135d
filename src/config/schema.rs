//! JSON schema for the YAML configuration document
//!
//! The document is converted to JSON and checked before any typed parsing, so
//! that every offending field is reported at once instead of one per run.

use jsonschema::validator_for;
use serde_json::{json, Value};

use super::error::ConfigError;

fn label_ref() -> Value {
    json!({ "type": ["string", "integer"], "minimum": 0 })
}

fn token_source() -> Value {
    json!({
        "oneOf": [
            { "type": "string" },
            {
                "type": "object",
                "properties": { "env": { "type": "string", "minLength": 1 } },
                "required": ["env"],
                "additionalProperties": false
            }
        ]
    })
}

fn issue_identifier() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "label": label_ref(),
            "pattern": { "type": "string", "minLength": 1 }
        },
        "required": ["name", "label", "pattern"],
        "additionalProperties": false
    })
}

/// Schema of the whole configuration document.
pub fn config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "connection": {
                "type": "object",
                "properties": {
                    "url": { "type": "string", "minLength": 1 },
                    "project_id": { "type": "integer", "minimum": 1 },
                    "private_token": token_source(),
                    "api_version": { "type": "string", "minLength": 1 },
                    "timeout": { "type": "integer", "minimum": 1 },
                    "ssl_verify": { "type": "boolean" }
                },
                "required": ["url", "project_id", "private_token"],
                "additionalProperties": false
            },
            "labels": {
                "type": "object",
                "properties": {
                    "to_do": label_ref(),
                    "in_progress": label_ref(),
                    "in_review": label_ref(),
                    "merged": label_ref(),
                    "backend": label_ref(),
                    "frontend": label_ref(),
                    "bug": label_ref()
                },
                "required": ["to_do", "in_progress", "in_review", "merged"],
                "additionalProperties": false
            },
            "patterns": {
                "type": "object",
                "properties": {
                    "issues_description_regex": { "type": "string", "minLength": 1 },
                    "issues_source_branch_regex": { "type": "string", "minLength": 1 },
                    "issues_source_branch": { "type": "string", "minLength": 1 },
                    "merge_protected_branch_regex": { "type": "string", "minLength": 1 },
                    "merge_protected_branches": { "type": "string", "minLength": 1 },
                    "issue_identifiers": {
                        "type": "array",
                        "items": issue_identifier()
                    }
                },
                "additionalProperties": false
            },
            "secret_token": token_source()
        },
        "required": ["connection", "labels"],
        "additionalProperties": false
    })
}

/// Check `document` against [`config_schema`], collecting every violation.
pub fn validate_document(document: &Value) -> Result<(), ConfigError> {
    let schema = config_schema();
    let validator = validator_for(&schema).map_err(|e| ConfigError::Schema(e.to_string()))?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|error| {
            let path = error.instance_path.to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            format!("{path}: {error}")
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::validation_errors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Value {
        json!({
            "connection": {
                "url": "https://www.example.com/",
                "project_id": 1,
                "private_token": "some_token"
            },
            "labels": { "to_do": 1, "in_progress": 2, "in_review": 3, "merged": 4 }
        })
    }

    #[test]
    fn test_schema_compiles() {
        assert!(validator_for(&config_schema()).is_ok());
    }

    #[test]
    fn test_valid_documents() {
        assert!(validate_document(&minimal()).is_ok());

        let full = json!({
            "connection": {
                "url": "https://www.example.com/",
                "project_id": 1,
                "private_token": { "env": "PRIVATE_TOKEN" },
                "timeout": 5,
                "api_version": "4",
                "ssl_verify": false
            },
            "labels": {
                "to_do": 1, "in_progress": 2, "in_review": 3, "merged": 4,
                "backend": 5, "frontend": "frontend"
            },
            "patterns": {
                "issues_source_branch": r"(\d+)",
                "merge_protected_branches": r"merge/(.+?)_to",
                "issue_identifiers": [
                    { "name": "backend", "label": "custom_backend", "pattern": r"\{BACKEND\}" }
                ]
            },
            "secret_token": "some_secret_token"
        });
        assert!(validate_document(&full).is_ok());
    }

    #[test]
    fn test_missing_private_token() {
        let mut doc = minimal();
        doc["connection"].as_object_mut().unwrap().remove("private_token");

        let err = validate_document(&doc).unwrap_err();
        let messages = err.validation_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("/connection"));
        assert!(messages[0].contains("private_token"));
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let mut doc = minimal();
        doc["labels"]["some_label"] = json!(5);

        let err = validate_document(&doc).unwrap_err();
        assert!(err.validation_messages()[0].contains("some_label"));
    }

    #[test]
    fn test_all_violations_are_reported() {
        let doc = json!({
            "connection": { "url": "https://www.example.com/", "project_id": "one" },
            "labels": { "to_do": 1, "in_progress": 2, "merged": 4, "extra": true }
        });

        let err = validate_document(&doc).unwrap_err();
        // wrong project_id type, missing private_token, missing in_review, unknown extra
        assert_eq!(err.validation_messages().len(), 4);
    }

    #[test]
    fn test_env_token_requires_name() {
        let mut doc = minimal();
        doc["connection"]["private_token"] = json!({ "name": "PRIVATE_TOKEN" });
        assert!(validate_document(&doc).is_err());
    }
}
