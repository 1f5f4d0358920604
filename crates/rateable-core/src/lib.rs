//! # rateable-core
//!
//! Schema-driven reviews and ratings for arbitrary host entities.
//!
//! Any entity that implements [`Reviewable`] can carry reviews. Each review
//! holds free text plus a set of named integer ratings whose allowed keys
//! come from the review's department in the [`RatingSchema`].
//!
//! ## Key Guarantees
//!
//! 1. **Lenient writes**: unknown rating keys are dropped and values are
//!    clamped to the schema bounds instead of rejecting the review
//! 2. **Host scoped**: every read and write is filtered by host reference
//! 3. **Approval gated**: aggregates only see reviews with the requested
//!    approval flag
//! 4. **Atomic**: a review and its ratings are created, updated and deleted
//!    as one unit
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rateable_core::{
//!     HostRef, MemoryReviewStore, RatingSchema, ReviewAggregator, ReviewInput, Reviewable,
//! };
//!
//! let aggregator = ReviewAggregator::new(
//!     Arc::new(MemoryReviewStore::new()),
//!     Arc::new(RatingSchema::default()),
//! )
//! .unwrap();
//! let business = HostRef::new("business", 12).rateable(&aggregator);
//!
//! business
//!     .add_review(
//!         ReviewInput::new().approved(true).rating("overall", 5).rating("price", 3),
//!         Some("42"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(business.average_rating("overall", true).unwrap(), Some(5.0));
//! assert_eq!(business.rating_stats(None, true).unwrap().total, 2);
//! ```

pub mod aggregator;
pub mod facade;
pub mod schema;
pub mod service;
pub mod stats;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use aggregator::ReviewAggregator;
pub use facade::{ReviewRateable, Reviewable};
pub use schema::{
    validate_schema_document, DepartmentSchema, RatingSchema, SchemaError, Violation,
    MAX_RATING_SPAN,
};
pub use service::ReviewRateableService;
pub use stats::round_average;
pub use store::{
    MemoryReviewStore, RatingQuery, ReviewOrder, ReviewQuery, ReviewStore, SortOrder,
    StoreError,
};
pub use types::{
    HostRef, Rating, RatingId, RatingStats, Review, ReviewId, ReviewInput, ReviewUpdate,
    DEFAULT_DEPARTMENT,
};

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the service adapter and the setup helpers.
#[derive(Error, Debug)]
pub enum RateableError {
    #[error("No host model bound; call set_model first")]
    NotConfigured,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Aggregator over a fresh in-memory store, configured from a schema file.
///
/// A `None` path uses the five-point default schema.
pub fn memory_aggregator(
    schema_path: Option<&Path>,
) -> Result<ReviewAggregator<MemoryReviewStore>, RateableError> {
    let schema = match schema_path {
        Some(path) => RatingSchema::from_file(path)?,
        None => RatingSchema::default(),
    };
    Ok(ReviewAggregator::new(
        Arc::new(MemoryReviewStore::new()),
        Arc::new(schema),
    )?)
}
