//! Storage contract for reviews and ratings.
//!
//! The aggregator never builds query strings. Everything it needs is
//! expressed through the primitives here: equality filters, ordering,
//! row limits and grouped aggregates over rating rows.
//!
//! Implementations must treat `insert_review`, `update_review` and
//! `delete_review` as single atomic units covering the review row and all
//! of its rating rows.

mod memory;

pub use memory::MemoryReviewStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{HostRef, Rating, RatingId, Review, ReviewId};

/// Errors surfaced by a store backend. Propagated to callers unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Column used to order review results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOrder {
    CreatedAt,
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Equality filters over review rows, with optional ordering and limit.
///
/// Unset filters match everything. Without an explicit order, results come
/// back by ascending id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewQuery {
    pub host: Option<HostRef>,
    pub department: Option<String>,
    pub approved: Option<bool>,
    pub author_id: Option<String>,

    /// Keep only reviews holding at least one rating with this value
    pub rating_value: Option<i32>,

    pub order: Option<(ReviewOrder, SortOrder)>,
    pub limit: Option<usize>,
}

impl ReviewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_host(host: &HostRef) -> Self {
        Self {
            host: Some(host.clone()),
            ..Self::default()
        }
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Filter on department only when one is given.
    pub fn maybe_department(mut self, department: Option<&str>) -> Self {
        self.department = department.map(str::to_string);
        self
    }

    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = Some(approved);
        self
    }

    pub fn author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn with_rating_value(mut self, value: i32) -> Self {
        self.rating_value = Some(value);
        self
    }

    pub fn order_by(mut self, column: ReviewOrder, direction: SortOrder) -> Self {
        self.order = Some((column, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a review row passes the column filters.
    ///
    /// `rating_value` needs the review's ratings and is checked separately.
    pub fn matches_row(&self, review: &Review) -> bool {
        self.host.as_ref().map_or(true, |h| &review.host == h)
            && self
                .department
                .as_ref()
                .map_or(true, |d| &review.department == d)
            && self.approved.map_or(true, |a| review.approved == a)
            && self
                .author_id
                .as_ref()
                .map_or(true, |a| review.author_id.as_ref() == Some(a))
    }
}

/// Filters over rating rows, joined to their owning review.
///
/// Ordering and limit on `reviews` do not apply to rating queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingQuery {
    pub reviews: ReviewQuery,
    pub review_id: Option<ReviewId>,
    pub key: Option<String>,
    pub value: Option<i32>,
}

impl RatingQuery {
    pub fn new(reviews: ReviewQuery) -> Self {
        Self {
            reviews,
            ..Self::default()
        }
    }

    pub fn review(mut self, review_id: ReviewId) -> Self {
        self.review_id = Some(review_id);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn value(mut self, value: i32) -> Self {
        self.value = Some(value);
        self
    }

    /// Whether a rating row passes the rating-level filters.
    pub fn matches_rating(&self, rating: &Rating) -> bool {
        self.review_id.map_or(true, |id| rating.review_id == id)
            && self.key.as_ref().map_or(true, |k| &rating.key == k)
            && self.value.map_or(true, |v| rating.value == v)
    }
}

/// Column to group rating aggregates by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingGroup {
    /// One row over every matching rating
    All,
    Key,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    All,
    Key(String),
    Value(i32),
}

/// COUNT/SUM over one group of rating rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub group: GroupKey,
    pub count: u64,
    pub sum: i64,
}

impl RatingAggregate {
    /// AVG for the group; `None` when the group is empty.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum as f64 / self.count as f64)
        }
    }
}

/// Review row to create. Timestamps and id are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub host: HostRef,
    pub author_id: Option<String>,
    pub text: Option<String>,
    pub department: String,
    pub recommend: bool,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRating {
    pub key: String,
    pub value: i32,
}

/// Column changes for an existing review. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewChanges {
    pub text: Option<String>,
    pub department: Option<String>,
    pub recommend: Option<bool>,
    pub approved: Option<bool>,
}

impl ReviewChanges {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.department.is_none()
            && self.recommend.is_none()
            && self.approved.is_none()
    }
}

/// Rating write applied together with a review update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingWrite {
    /// Overwrite the value of an existing rating row
    Update { id: RatingId, value: i32 },
    /// Add a new rating row to the review
    Create(NewRating),
}

/// Persistence backend for reviews and ratings.
pub trait ReviewStore: Send + Sync {
    /// Create a review and its ratings as one unit.
    ///
    /// Fails with `Conflict` if two ratings share a key.
    fn insert_review(&self, review: NewReview, ratings: Vec<NewRating>)
        -> Result<Review, StoreError>;

    /// Find a review by id, scoped to its host.
    fn find_review(
        &self,
        host: &HostRef,
        id: ReviewId,
        with_ratings: bool,
    ) -> Result<Option<Review>, StoreError>;

    /// Apply column changes and rating writes as one unit.
    ///
    /// Fails with `NotFound` for an unknown review or rating id and with
    /// `Conflict` when a created rating's key already exists on the review.
    fn update_review(
        &self,
        id: ReviewId,
        changes: ReviewChanges,
        ratings: Vec<RatingWrite>,
    ) -> Result<Review, StoreError>;

    /// Delete a review together with all of its ratings.
    fn delete_review(&self, id: ReviewId) -> Result<(), StoreError>;

    fn find_reviews(&self, query: &ReviewQuery, with_ratings: bool)
        -> Result<Vec<Review>, StoreError>;

    /// COUNT of reviews matching the query (ordering and limit ignored).
    fn count_reviews(&self, query: &ReviewQuery) -> Result<u64, StoreError>;

    fn find_ratings(&self, query: &RatingQuery) -> Result<Vec<Rating>, StoreError>;

    /// Grouped COUNT/SUM over matching ratings. Empty groups are omitted.
    fn aggregate_ratings(
        &self,
        query: &RatingQuery,
        group: RatingGroup,
    ) -> Result<Vec<RatingAggregate>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_average() {
        let agg = RatingAggregate {
            group: GroupKey::All,
            count: 4,
            sum: 17,
        };
        assert_eq!(agg.average(), Some(4.25));

        let empty = RatingAggregate {
            group: GroupKey::All,
            count: 0,
            sum: 0,
        };
        assert_eq!(empty.average(), None);
    }

    #[test]
    fn test_review_changes_empty() {
        assert!(ReviewChanges::default().is_empty());
        let changes = ReviewChanges {
            approved: Some(true),
            ..ReviewChanges::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_query_builder() {
        let host = HostRef::new("product", 1);
        let query = ReviewQuery::for_host(&host)
            .approved(false)
            .maybe_department(None)
            .order_by(ReviewOrder::CreatedAt, SortOrder::Desc)
            .limit(3);
        assert_eq!(query.host, Some(host));
        assert_eq!(query.approved, Some(false));
        assert!(query.department.is_none());
        assert_eq!(query.order, Some((ReviewOrder::CreatedAt, SortOrder::Desc)));
        assert_eq!(query.limit, Some(3));
    }
}
