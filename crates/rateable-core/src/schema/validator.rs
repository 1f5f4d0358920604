//! Structural checks for rating schema documents.
//!
//! Documents are matched against the bundled `rating-schema.schema.json`
//! before serde sees them. Misspelled keys and out-of-range bounds then
//! fail loudly rather than quietly falling back to defaults.

use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

const DOCUMENT_SCHEMA: &str = include_str!("../../schema/rating-schema.schema.json");

/// One failed check, located by JSON pointer into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Pointer to the offending value; empty for the document root
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn compiled() -> Result<&'static jsonschema::Validator, &'static str> {
    static VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

    VALIDATOR
        .get_or_init(|| {
            let raw: serde_json::Value = serde_json::from_str(DOCUMENT_SCHEMA)
                .map_err(|e| format!("bundled rating schema is not JSON: {e}"))?;
            jsonschema::options()
                .build(&raw)
                .map_err(|e| format!("bundled rating schema does not compile: {e}"))
        })
        .as_ref()
        .map_err(String::as_str)
}

/// Check a document, collecting every violation rather than stopping at
/// the first.
pub fn validate_schema_document(document: &serde_json::Value) -> Result<(), Vec<Violation>> {
    let validator = compiled().map_err(|message| {
        vec![Violation {
            path: String::new(),
            message: message.to_string(),
        }]
    })?;

    let violations: Vec<Violation> = validator
        .iter_errors(document)
        .map(|error| Violation {
            path: error.instance_path.to_string(),
            message: error.to_string(),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_passes() {
        let value = serde_json::json!({});
        assert!(validate_schema_document(&value).is_ok());
    }

    #[test]
    fn test_full_document_passes() {
        let value = serde_json::json!({
            "min_rating_value": 1,
            "max_rating_value": 10,
            "approved_review": true,
            "departments": {
                "default": {
                    "ratings": {
                        "overall": "Overall Rating",
                        "price": "Price Rating"
                    }
                }
            }
        });
        assert!(validate_schema_document(&value).is_ok());
    }

    #[test]
    fn test_unknown_top_level_key_fails() {
        let value = serde_json::json!({
            "max_rating": 5
        });
        let errors = validate_schema_document(&value).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_non_integer_bound_fails() {
        let value = serde_json::json!({
            "max_rating_value": 4.5
        });
        assert!(validate_schema_document(&value).is_err());
    }

    #[test]
    fn test_bound_outside_allowed_values_fails() {
        let value = serde_json::json!({
            "min_rating_value": -2147483648i64,
            "max_rating_value": 5
        });
        let violations = validate_schema_document(&value).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "/min_rating_value");
        assert!(violations[0].to_string().starts_with("/min_rating_value: "));
    }

    #[test]
    fn test_department_without_ratings_fails() {
        let value = serde_json::json!({
            "departments": {
                "sales": {}
            }
        });
        assert!(validate_schema_document(&value).is_err());
    }

    #[test]
    fn test_empty_rating_map_fails() {
        let value = serde_json::json!({
            "departments": {
                "sales": { "ratings": {} }
            }
        });
        assert!(validate_schema_document(&value).is_err());
    }

    #[test]
    fn test_non_string_label_fails() {
        let value = serde_json::json!({
            "departments": {
                "sales": { "ratings": { "overall": 3 } }
            }
        });
        let violations = validate_schema_document(&value).unwrap_err();
        assert!(violations
            .iter()
            .any(|v| v.path == "/departments/sales/ratings/overall"));
    }
}
