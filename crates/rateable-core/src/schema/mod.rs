//! Rating schema loading and validation.
//!
//! A rating schema names the departments a review may belong to, the rating
//! keys each department accepts, and the global value bounds. Schema files
//! are YAML or JSON documents validated against an embedded JSON Schema.

mod parser;
mod validator;

pub use parser::{DepartmentSchema, RatingSchema, SchemaError, MAX_RATING_SPAN};
pub use validator::{validate_schema_document, Violation};
