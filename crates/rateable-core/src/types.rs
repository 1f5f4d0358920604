//! Review and rating records plus the inputs used to write them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Department used when a review doesn't name one.
pub const DEFAULT_DEPARTMENT: &str = "default";

/// Polymorphic reference to the entity a review is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostRef {
    /// Kind of host (e.g. "product", "location")
    pub host_type: String,

    /// Identifier of the host within its kind
    pub host_id: String,
}

impl HostRef {
    pub fn new(host_type: impl Into<String>, host_id: impl ToString) -> Self {
        Self {
            host_type: host_type.into(),
            host_id: host_id.to_string(),
        }
    }
}

impl fmt::Display for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.host_type, self.host_id)
    }
}

/// Store-assigned review identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub u64);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "review-{}", self.0)
    }
}

/// Store-assigned rating identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingId(pub u64);

impl fmt::Display for RatingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rating-{}", self.0)
    }
}

/// A single named value within a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub review_id: ReviewId,
    pub key: String,
    pub value: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A review attached to a host entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub host: HostRef,
    pub author_id: Option<String>,
    /// Free-form review content
    pub text: Option<String>,
    pub department: String,
    pub recommend: bool,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// `None` when the ratings were not loaded with the review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<Rating>>,
}

impl Review {
    pub fn ratings_loaded(&self) -> bool {
        self.ratings.is_some()
    }

    /// Loaded ratings, or an empty slice when none were fetched.
    pub fn ratings(&self) -> &[Rating] {
        self.ratings.as_deref().unwrap_or(&[])
    }

    /// The loaded rating stored under `key`, if any.
    pub fn rating(&self, key: &str) -> Option<&Rating> {
        self.ratings().iter().find(|r| r.key == key)
    }

    /// Loaded ratings as a key -> value map.
    pub fn rating_values(&self) -> BTreeMap<&str, i32> {
        self.ratings()
            .iter()
            .map(|r| (r.key.as_str(), r.value))
            .collect()
    }
}

/// Data for a new review.
///
/// Unset fields fall back to the department `"default"`, `recommend = false`
/// and the schema's approval default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub review: Option<String>,

    #[serde(default)]
    pub department: Option<String>,

    #[serde(default)]
    pub recommend: Option<bool>,

    #[serde(default)]
    pub approved: Option<bool>,

    /// Rating key -> raw value (clamped and filtered on write)
    #[serde(default)]
    pub ratings: BTreeMap<String, i32>,
}

impl ReviewInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.review = Some(text.into());
        self
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn recommend(mut self, recommend: bool) -> Self {
        self.recommend = Some(recommend);
        self
    }

    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = Some(approved);
        self
    }

    pub fn rating(mut self, key: impl Into<String>, value: i32) -> Self {
        self.ratings.insert(key.into(), value);
        self
    }
}

/// Partial update of an existing review. Only the fields that are set change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    #[serde(default)]
    pub review: Option<String>,

    #[serde(default)]
    pub department: Option<String>,

    #[serde(default)]
    pub recommend: Option<bool>,

    #[serde(default)]
    pub approved: Option<bool>,

    #[serde(default)]
    pub ratings: Option<BTreeMap<String, i32>>,
}

impl ReviewUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.review = Some(text.into());
        self
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn recommend(mut self, recommend: bool) -> Self {
        self.recommend = Some(recommend);
        self
    }

    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = Some(approved);
        self
    }

    pub fn rating(mut self, key: impl Into<String>, value: i32) -> Self {
        self.ratings
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }
}

/// Histogram of rating values with percentage breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingStats {
    /// Value -> occurrences, zero-filled across the schema's value range
    pub counts: BTreeMap<i32, u64>,

    /// Value -> share of `total` in whole percent
    pub percentages: BTreeMap<i32, u32>,

    /// Sum of `counts`
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(id: u64, key: &str, value: i32) -> Rating {
        let now = Utc::now();
        Rating {
            id: RatingId(id),
            review_id: ReviewId(1),
            key: key.to_string(),
            value,
            created_at: now,
            updated_at: now,
        }
    }

    fn review(ratings: Option<Vec<Rating>>) -> Review {
        let now = Utc::now();
        Review {
            id: ReviewId(1),
            host: HostRef::new("product", 7),
            author_id: None,
            text: None,
            department: DEFAULT_DEPARTMENT.to_string(),
            recommend: false,
            approved: true,
            created_at: now,
            updated_at: now,
            ratings,
        }
    }

    #[test]
    fn test_host_ref_display() {
        assert_eq!(HostRef::new("product", 42).to_string(), "product#42");
    }

    #[test]
    fn test_review_rating_lookup() {
        let review = review(Some(vec![rating(1, "overall", 5), rating(2, "price", 3)]));
        assert!(review.ratings_loaded());
        assert_eq!(review.rating("price").map(|r| r.value), Some(3));
        assert!(review.rating("quality").is_none());
        assert_eq!(review.rating_values().get("overall"), Some(&5));
    }

    #[test]
    fn test_unloaded_ratings_are_empty() {
        let review = review(None);
        assert!(!review.ratings_loaded());
        assert!(review.ratings().is_empty());
    }

    #[test]
    fn test_input_builder() {
        let input = ReviewInput::new()
            .text("Great")
            .department("sales")
            .approved(true)
            .rating("overall", 5);
        assert_eq!(input.review.as_deref(), Some("Great"));
        assert_eq!(input.department.as_deref(), Some("sales"));
        assert_eq!(input.recommend, None);
        assert_eq!(input.ratings.get("overall"), Some(&5));
    }

    #[test]
    fn test_input_deserializes_partial_json() {
        let input: ReviewInput =
            serde_json::from_str(r#"{"review": "ok", "ratings": {"overall": 4}}"#).unwrap();
        assert_eq!(input.department, None);
        assert_eq!(input.ratings.len(), 1);
    }

    #[test]
    fn test_update_builder_collects_ratings() {
        let update = ReviewUpdate::new().rating("overall", 4).rating("price", 2);
        assert_eq!(update.ratings.as_ref().map(|r| r.len()), Some(2));
        assert!(update.review.is_none());
    }
}
