//! Rating schema parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;

use super::validator::validate_schema_document;
use crate::types::DEFAULT_DEPARTMENT;

/// Errors that can occur when loading a rating schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Schema validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid rating bounds: min_rating_value {min} is greater than max_rating_value {max}")]
    InvalidBounds { min: i32, max: i32 },

    #[error("Rating range {min}..={max} is wider than {} steps", MAX_RATING_SPAN)]
    RangeTooWide { min: i32, max: i32 },

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Largest allowed `max_rating_value - min_rating_value`.
///
/// Histograms hold one bucket per value in range, so the span is capped.
pub const MAX_RATING_SPAN: i64 = 100;

/// The rating keys one department accepts, with their display labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DepartmentSchema {
    /// Rating key -> display label (e.g. `overall` -> "Overall Rating")
    #[serde(default)]
    pub ratings: BTreeMap<String, String>,
}

impl DepartmentSchema {
    /// Build a department from `(key, label)` pairs.
    pub fn from_pairs<K, L>(pairs: impl IntoIterator<Item = (K, L)>) -> Self
    where
        K: Into<String>,
        L: Into<String>,
    {
        Self {
            ratings: pairs
                .into_iter()
                .map(|(key, label)| (key.into(), label.into()))
                .collect(),
        }
    }

    pub fn allows(&self, key: &str) -> bool {
        self.ratings.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.ratings.keys().map(String::as_str)
    }
}

/// Global rating configuration: value bounds, approval default, departments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingSchema {
    /// Lowest storable value (inclusive)
    #[serde(default = "default_min_rating")]
    pub min_rating_value: i32,

    /// Highest storable value (inclusive)
    #[serde(default = "default_max_rating")]
    pub max_rating_value: i32,

    /// Approval state for new reviews that don't specify one
    #[serde(default)]
    pub approved_review: bool,

    /// Department name -> accepted rating keys
    #[serde(default = "default_departments")]
    pub departments: BTreeMap<String, DepartmentSchema>,
}

fn default_min_rating() -> i32 {
    1
}

fn default_max_rating() -> i32 {
    5
}

fn default_departments() -> BTreeMap<String, DepartmentSchema> {
    let mut departments = BTreeMap::new();
    departments.insert(
        DEFAULT_DEPARTMENT.to_string(),
        DepartmentSchema::from_pairs([
            ("overall", "Overall Rating"),
            ("customer_service", "Customer Service Rating"),
            ("quality", "Quality Rating"),
            ("price", "Price Rating"),
        ]),
    );
    departments.insert(
        "sales".to_string(),
        DepartmentSchema::from_pairs([
            ("overall", "Overall Rating"),
            ("communication", "Communication Rating"),
            ("follow_up", "Follow-Up Rating"),
            ("price", "Price Rating"),
        ]),
    );
    departments.insert(
        "support".to_string(),
        DepartmentSchema::from_pairs([
            ("overall", "Overall Rating"),
            ("speed", "Response Speed"),
            ("knowledge", "Knowledge Rating"),
        ]),
    );
    departments
}

impl Default for RatingSchema {
    fn default() -> Self {
        Self {
            min_rating_value: default_min_rating(),
            max_rating_value: default_max_rating(),
            approved_review: false,
            departments: default_departments(),
        }
    }
}

impl RatingSchema {
    /// The ten-point profile: same departments, values in `1..=10`.
    pub fn ten_point() -> Self {
        Self {
            max_rating_value: 10,
            ..Self::default()
        }
    }

    /// Build a schema with explicit bounds and no departments.
    pub fn with_bounds(min: i32, max: i32) -> Result<Self, SchemaError> {
        let schema = Self {
            min_rating_value: min,
            max_rating_value: max,
            approved_review: false,
            departments: BTreeMap::new(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Add or replace a department.
    pub fn department_with(mut self, name: impl Into<String>, department: DepartmentSchema) -> Self {
        self.departments.insert(name.into(), department);
        self
    }

    /// Set the approval default for new reviews.
    pub fn approve_by_default(mut self, approved: bool) -> Self {
        self.approved_review = approved;
        self
    }

    /// Parse a schema from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        if yaml.trim().is_empty() {
            return Self::from_document(serde_json::Value::Null);
        }
        let document: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_document(document)
    }

    /// Parse a schema from JSON string.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Parse a schema from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a schema from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a schema file, picking the format from its extension.
    ///
    /// `.json` files are read as JSON; anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    fn from_document(document: serde_json::Value) -> Result<Self, SchemaError> {
        // An empty YAML file parses to null; treat it as "all defaults".
        let document = if document.is_null() {
            serde_json::json!({})
        } else {
            document
        };

        validate_schema_document(&document).map_err(|violations| {
            let joined: Vec<String> = violations.iter().map(ToString::to_string).collect();
            SchemaError::ValidationError(joined.join("; "))
        })?;

        let schema: RatingSchema = serde_json::from_value(document)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Validate the structural invariants JSON Schema can't express.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.min_rating_value > self.max_rating_value {
            return Err(SchemaError::InvalidBounds {
                min: self.min_rating_value,
                max: self.max_rating_value,
            });
        }
        let span = i64::from(self.max_rating_value) - i64::from(self.min_rating_value);
        if span > MAX_RATING_SPAN {
            return Err(SchemaError::RangeTooWide {
                min: self.min_rating_value,
                max: self.max_rating_value,
            });
        }

        for (name, department) in &self.departments {
            if name.trim().is_empty() {
                return Err(SchemaError::MissingField("departments.<name>".to_string()));
            }
            if department.ratings.is_empty() {
                return Err(SchemaError::ValidationError(format!(
                    "Department '{}' defines no rating keys",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Look up a department by name.
    pub fn department(&self, name: &str) -> Option<&DepartmentSchema> {
        self.departments.get(name)
    }

    /// Whether `key` may be written on a review of `department`.
    pub fn allows(&self, department: &str, key: &str) -> bool {
        self.department(department)
            .map(|d| d.allows(key))
            .unwrap_or(false)
    }

    /// Display label for a rating key within a department.
    pub fn label(&self, department: &str, key: &str) -> Option<&str> {
        self.department(department)
            .and_then(|d| d.ratings.get(key))
            .map(String::as_str)
    }

    /// Force `value` into `[min_rating_value, max_rating_value]`.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min_rating_value, self.max_rating_value)
    }

    /// Every storable rating value, lowest first.
    pub fn value_range(&self) -> RangeInclusive<i32> {
        self.min_rating_value..=self.max_rating_value
    }
}
