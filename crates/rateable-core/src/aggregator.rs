//! ReviewAggregator: schema-gated writes and rating aggregates.
//!
//! Writes apply the leniency policy: values outside the schema bounds are
//! clamped and rating keys the department doesn't define are dropped. Reads
//! filter every query by host and approval flag, plus department where asked.
//!
//! Every operation takes the host explicitly; the facade and the service
//! adapter only bind that argument.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::schema::{RatingSchema, SchemaError};
use crate::stats::{fill_counts, stats_from_counts};
use crate::store::{
    GroupKey, NewRating, NewReview, RatingGroup, RatingQuery, RatingWrite, ReviewChanges,
    ReviewOrder, ReviewQuery, ReviewStore, SortOrder, StoreError,
};
use crate::types::{
    HostRef, Rating, RatingStats, Review, ReviewId, ReviewInput, ReviewUpdate,
    DEFAULT_DEPARTMENT,
};

/// Review writes and aggregate reads over a `ReviewStore`.
pub struct ReviewAggregator<S> {
    store: Arc<S>,
    schema: Arc<RatingSchema>,
}

impl<S> Clone for ReviewAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<S: ReviewStore> ReviewAggregator<S> {
    /// Fails when the schema's bounds are inverted or too wide, since
    /// clamping and histograms depend on them.
    pub fn new(store: Arc<S>, schema: Arc<RatingSchema>) -> Result<Self, SchemaError> {
        schema.validate()?;
        Ok(Self { store, schema })
    }

    pub fn schema(&self) -> &RatingSchema {
        &self.schema
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // --- Writes ---

    /// Create a review with its schema-approved ratings.
    ///
    /// Only keys the department defines are stored; each value is clamped to
    /// the schema bounds. Review and ratings are written as one unit.
    pub fn add_review(
        &self,
        host: &HostRef,
        input: ReviewInput,
        author_id: Option<&str>,
    ) -> Result<Review, StoreError> {
        let department = input
            .department
            .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string());
        let approved = input.approved.unwrap_or(self.schema.approved_review);

        let ratings = match self.schema.department(&department) {
            Some(allowed) => allowed
                .keys()
                .filter_map(|key| {
                    input.ratings.get(key).map(|&raw| NewRating {
                        key: key.to_string(),
                        value: self.clamp_logged(key, raw),
                    })
                })
                .collect(),
            None => {
                warn!(%host, department = %department, "department not in rating schema; no ratings accepted");
                Vec::new()
            }
        };

        for key in input.ratings.keys() {
            if !self.schema.allows(&department, key) {
                debug!(%host, department = %department, key = %key, "dropping rating key not in department schema");
            }
        }

        let review = self.store.insert_review(
            NewReview {
                host: host.clone(),
                author_id: author_id.map(str::to_string),
                text: input.review,
                department,
                recommend: input.recommend.unwrap_or(false),
                approved,
            },
            ratings,
        )?;

        info!(
            %host,
            review_id = %review.id,
            ratings = review.ratings().len(),
            approved = review.approved,
            "review added"
        );
        Ok(review)
    }

    /// Apply a partial update. Returns `false` when the host has no such review.
    ///
    /// Existing rating keys are updated in place. New keys are created only if
    /// the review's department (after this update) defines them.
    pub fn update_review(
        &self,
        host: &HostRef,
        review_id: ReviewId,
        update: ReviewUpdate,
    ) -> Result<bool, StoreError> {
        let Some(review) = self.store.find_review(host, review_id, true)? else {
            return Ok(false);
        };

        let changes = ReviewChanges {
            text: update.review,
            department: update.department,
            recommend: update.recommend,
            approved: update.approved,
        };

        let department = changes
            .department
            .clone()
            .unwrap_or_else(|| review.department.clone());
        if changes.department.is_some() && self.schema.department(&department).is_none() {
            warn!(%host, %review_id, department = %department, "review moved to a department not in rating schema");
        }

        let mut writes = Vec::new();
        for (key, raw) in update.ratings.unwrap_or_default() {
            let value = self.clamp_logged(&key, raw);
            match review.rating(&key) {
                Some(existing) => writes.push(RatingWrite::Update {
                    id: existing.id,
                    value,
                }),
                None if self.schema.allows(&department, &key) => {
                    writes.push(RatingWrite::Create(NewRating { key, value }))
                }
                None => {
                    debug!(%host, %review_id, key = %key, "skipping rating key not in department schema");
                }
            }
        }

        if changes.is_empty() && writes.is_empty() {
            return Ok(true);
        }

        self.store.update_review(review_id, changes, writes)?;
        debug!(%host, %review_id, "review updated");
        Ok(true)
    }

    /// Mark a review approved. Returns `false` when the host has no such review.
    pub fn approve_review(&self, host: &HostRef, review_id: ReviewId) -> Result<bool, StoreError> {
        if self.store.find_review(host, review_id, false)?.is_none() {
            return Ok(false);
        }

        let changes = ReviewChanges {
            approved: Some(true),
            ..ReviewChanges::default()
        };
        self.store.update_review(review_id, changes, Vec::new())?;
        info!(%host, %review_id, "review approved");
        Ok(true)
    }

    /// Delete a review and its ratings. Returns `false` when the host has no such review.
    pub fn delete_review(&self, host: &HostRef, review_id: ReviewId) -> Result<bool, StoreError> {
        if self.store.find_review(host, review_id, false)?.is_none() {
            return Ok(false);
        }

        self.store.delete_review(review_id)?;
        info!(%host, %review_id, "review deleted");
        Ok(true)
    }

    // --- Averages ---

    /// Mean value of `key` across the host's reviews with the given approval.
    ///
    /// `None` when no rating matches; `0.0` is a real average.
    pub fn average_rating(
        &self,
        host: &HostRef,
        key: &str,
        approved: bool,
    ) -> Result<Option<f64>, StoreError> {
        let query = RatingQuery::new(ReviewQuery::for_host(host).approved(approved)).key(key);
        self.single_average(&query)
    }

    /// Mean value per rating key present on matching reviews.
    pub fn average_ratings(
        &self,
        host: &HostRef,
        approved: bool,
    ) -> Result<BTreeMap<String, f64>, StoreError> {
        let query = RatingQuery::new(ReviewQuery::for_host(host).approved(approved));
        self.averages_by_key(&query)
    }

    pub fn average_rating_by_department(
        &self,
        host: &HostRef,
        department: &str,
        key: &str,
        approved: bool,
    ) -> Result<Option<f64>, StoreError> {
        let reviews = ReviewQuery::for_host(host)
            .department(department)
            .approved(approved);
        self.single_average(&RatingQuery::new(reviews).key(key))
    }

    pub fn average_ratings_by_department(
        &self,
        host: &HostRef,
        department: &str,
        approved: bool,
    ) -> Result<BTreeMap<String, f64>, StoreError> {
        let reviews = ReviewQuery::for_host(host)
            .department(department)
            .approved(approved);
        self.averages_by_key(&RatingQuery::new(reviews))
    }

    /// Mean of every rating on every matching review, across all keys.
    pub fn overall_average_rating(
        &self,
        host: &HostRef,
        approved: bool,
    ) -> Result<Option<f64>, StoreError> {
        let query = RatingQuery::new(ReviewQuery::for_host(host).approved(approved));
        self.single_average(&query)
    }

    // --- Review listings ---

    /// All reviews with the given approval. `with_ratings` only controls loading.
    pub fn get_reviews(
        &self,
        host: &HostRef,
        approved: bool,
        with_ratings: bool,
    ) -> Result<Vec<Review>, StoreError> {
        let query = ReviewQuery::for_host(host).approved(approved);
        self.store.find_reviews(&query, with_ratings)
    }

    pub fn get_reviews_by_department(
        &self,
        host: &HostRef,
        department: &str,
        approved: bool,
        with_ratings: bool,
    ) -> Result<Vec<Review>, StoreError> {
        let query = ReviewQuery::for_host(host)
            .department(department)
            .approved(approved);
        self.store.find_reviews(&query, with_ratings)
    }

    /// Reviews holding at least one rating equal to `star_value`.
    ///
    /// A `None` department matches every department. The approval filter
    /// applies both ways: `approved = false` returns only pending reviews,
    /// not reviews in either state.
    pub fn get_reviews_by_rating(
        &self,
        host: &HostRef,
        star_value: i32,
        department: Option<&str>,
        approved: bool,
        with_ratings: bool,
    ) -> Result<Vec<Review>, StoreError> {
        let query = ReviewQuery::for_host(host)
            .maybe_department(department)
            .approved(approved)
            .with_rating_value(star_value);
        self.store.find_reviews(&query, with_ratings)
    }

    /// Newest reviews first, at most `limit`.
    pub fn recent_reviews(
        &self,
        host: &HostRef,
        limit: usize,
        approved: bool,
    ) -> Result<Vec<Review>, StoreError> {
        let query = ReviewQuery::for_host(host)
            .approved(approved)
            .order_by(ReviewOrder::CreatedAt, SortOrder::Desc)
            .limit(limit);
        self.store.find_reviews(&query, true)
    }

    /// Newest reviews by one author on this host, at most `limit`.
    pub fn author_reviews(
        &self,
        host: &HostRef,
        author_id: &str,
        limit: usize,
        approved: bool,
    ) -> Result<Vec<Review>, StoreError> {
        let query = ReviewQuery::for_host(host)
            .author(author_id)
            .approved(approved)
            .order_by(ReviewOrder::CreatedAt, SortOrder::Desc)
            .limit(limit);
        self.store.find_reviews(&query, true)
    }

    /// Every rating row of one review; empty for unknown or deleted reviews.
    pub fn ratings_for_review(
        &self,
        host: &HostRef,
        review_id: ReviewId,
    ) -> Result<Vec<Rating>, StoreError> {
        let query = RatingQuery::new(ReviewQuery::for_host(host)).review(review_id);
        self.store.find_ratings(&query)
    }

    /// Run a caller-built review query, always pinned to `host`.
    pub fn find_reviews(
        &self,
        host: &HostRef,
        query: ReviewQuery,
        with_ratings: bool,
    ) -> Result<Vec<Review>, StoreError> {
        let query = ReviewQuery {
            host: Some(host.clone()),
            ..query
        };
        self.store.find_reviews(&query, with_ratings)
    }

    // --- Counts ---

    pub fn total_reviews(&self, host: &HostRef, approved: bool) -> Result<u64, StoreError> {
        self.store
            .count_reviews(&ReviewQuery::for_host(host).approved(approved))
    }

    pub fn total_department_reviews(
        &self,
        host: &HostRef,
        department: &str,
        approved: bool,
    ) -> Result<u64, StoreError> {
        let query = ReviewQuery::for_host(host)
            .department(department)
            .approved(approved);
        self.store.count_reviews(&query)
    }

    /// Value -> occurrences, zero-filled for every value in the schema bounds.
    ///
    /// A `None` department counts across every department.
    pub fn rating_counts(
        &self,
        host: &HostRef,
        department: Option<&str>,
        approved: bool,
    ) -> Result<BTreeMap<i32, u64>, StoreError> {
        let reviews = ReviewQuery::for_host(host)
            .maybe_department(department)
            .approved(approved);
        let rows = self
            .store
            .aggregate_ratings(&RatingQuery::new(reviews), RatingGroup::Value)?;

        let observed = rows.into_iter().filter_map(|row| match row.group {
            GroupKey::Value(value) => Some((value, row.count)),
            _ => None,
        });
        Ok(fill_counts(observed, self.schema.value_range()))
    }

    /// Histogram plus whole-percent breakdown and total.
    pub fn rating_stats(
        &self,
        host: &HostRef,
        department: Option<&str>,
        approved: bool,
    ) -> Result<RatingStats, StoreError> {
        let counts = self.rating_counts(host, department, approved)?;
        Ok(stats_from_counts(counts))
    }

    // --- Helpers ---

    fn clamp_logged(&self, key: &str, raw: i32) -> i32 {
        let value = self.schema.clamp(raw);
        if value != raw {
            debug!(key = %key, raw, clamped = value, "rating value clamped to schema bounds");
        }
        value
    }

    fn single_average(&self, query: &RatingQuery) -> Result<Option<f64>, StoreError> {
        let rows = self.store.aggregate_ratings(query, RatingGroup::All)?;
        Ok(rows.first().and_then(|row| row.average()))
    }

    fn averages_by_key(&self, query: &RatingQuery) -> Result<BTreeMap<String, f64>, StoreError> {
        let rows = self.store.aggregate_ratings(query, RatingGroup::Key)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let average = row.average()?;
                match row.group {
                    GroupKey::Key(key) => Some((key, average)),
                    _ => None,
                }
            })
            .collect())
    }
}
