//! Attach reviews to host entities.
//!
//! A host type implements [`Reviewable`] to say how it is identified. The
//! [`ReviewRateable`] handle then binds that identity to an aggregator so
//! every operation runs scoped to the host.

use std::collections::BTreeMap;

use crate::aggregator::ReviewAggregator;
use crate::store::{ReviewQuery, ReviewStore, StoreError};
use crate::types::{
    HostRef, Rating, RatingStats, Review, ReviewId, ReviewInput, ReviewUpdate,
};

/// An entity reviews can be attached to.
pub trait Reviewable {
    fn review_host(&self) -> HostRef;

    /// Bind this entity to an aggregator.
    fn rateable<S: ReviewStore>(&self, aggregator: &ReviewAggregator<S>) -> ReviewRateable<S>
    where
        Self: Sized,
    {
        ReviewRateable::new(self.review_host(), aggregator.clone())
    }
}

impl Reviewable for HostRef {
    fn review_host(&self) -> HostRef {
        self.clone()
    }
}

/// Review operations for one host.
pub struct ReviewRateable<S> {
    host: HostRef,
    aggregator: ReviewAggregator<S>,
}

impl<S> Clone for ReviewRateable<S> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            aggregator: self.aggregator.clone(),
        }
    }
}

impl<S: ReviewStore> ReviewRateable<S> {
    pub fn new(host: HostRef, aggregator: ReviewAggregator<S>) -> Self {
        Self { host, aggregator }
    }

    pub fn host(&self) -> &HostRef {
        &self.host
    }

    /// Query builder already scoped to this host.
    pub fn reviews(&self) -> ReviewQuery {
        ReviewQuery::for_host(&self.host)
    }

    pub fn find_reviews(
        &self,
        query: ReviewQuery,
        with_ratings: bool,
    ) -> Result<Vec<Review>, StoreError> {
        self.aggregator.find_reviews(&self.host, query, with_ratings)
    }

    pub fn add_review(
        &self,
        input: ReviewInput,
        author_id: Option<&str>,
    ) -> Result<Review, StoreError> {
        self.aggregator.add_review(&self.host, input, author_id)
    }

    pub fn update_review(&self, review_id: ReviewId, update: ReviewUpdate) -> Result<bool, StoreError> {
        self.aggregator.update_review(&self.host, review_id, update)
    }

    pub fn approve_review(&self, review_id: ReviewId) -> Result<bool, StoreError> {
        self.aggregator.approve_review(&self.host, review_id)
    }

    pub fn delete_review(&self, review_id: ReviewId) -> Result<bool, StoreError> {
        self.aggregator.delete_review(&self.host, review_id)
    }

    pub fn average_rating(&self, key: &str, approved: bool) -> Result<Option<f64>, StoreError> {
        self.aggregator.average_rating(&self.host, key, approved)
    }

    pub fn average_ratings(&self, approved: bool) -> Result<BTreeMap<String, f64>, StoreError> {
        self.aggregator.average_ratings(&self.host, approved)
    }

    pub fn average_rating_by_department(
        &self,
        department: &str,
        key: &str,
        approved: bool,
    ) -> Result<Option<f64>, StoreError> {
        self.aggregator
            .average_rating_by_department(&self.host, department, key, approved)
    }

    pub fn average_ratings_by_department(
        &self,
        department: &str,
        approved: bool,
    ) -> Result<BTreeMap<String, f64>, StoreError> {
        self.aggregator
            .average_ratings_by_department(&self.host, department, approved)
    }

    pub fn overall_average_rating(&self, approved: bool) -> Result<Option<f64>, StoreError> {
        self.aggregator.overall_average_rating(&self.host, approved)
    }

    pub fn get_reviews(&self, approved: bool, with_ratings: bool) -> Result<Vec<Review>, StoreError> {
        self.aggregator.get_reviews(&self.host, approved, with_ratings)
    }

    pub fn get_reviews_by_department(
        &self,
        department: &str,
        approved: bool,
        with_ratings: bool,
    ) -> Result<Vec<Review>, StoreError> {
        self.aggregator
            .get_reviews_by_department(&self.host, department, approved, with_ratings)
    }

    pub fn get_reviews_by_rating(
        &self,
        star_value: i32,
        department: Option<&str>,
        approved: bool,
        with_ratings: bool,
    ) -> Result<Vec<Review>, StoreError> {
        self.aggregator.get_reviews_by_rating(
            &self.host,
            star_value,
            department,
            approved,
            with_ratings,
        )
    }

    pub fn recent_reviews(&self, limit: usize, approved: bool) -> Result<Vec<Review>, StoreError> {
        self.aggregator.recent_reviews(&self.host, limit, approved)
    }

    pub fn author_reviews(
        &self,
        author_id: &str,
        limit: usize,
        approved: bool,
    ) -> Result<Vec<Review>, StoreError> {
        self.aggregator
            .author_reviews(&self.host, author_id, limit, approved)
    }

    pub fn ratings_for_review(&self, review_id: ReviewId) -> Result<Vec<Rating>, StoreError> {
        self.aggregator.ratings_for_review(&self.host, review_id)
    }

    pub fn total_reviews(&self, approved: bool) -> Result<u64, StoreError> {
        self.aggregator.total_reviews(&self.host, approved)
    }

    pub fn total_department_reviews(&self, department: &str, approved: bool) -> Result<u64, StoreError> {
        self.aggregator
            .total_department_reviews(&self.host, department, approved)
    }

    pub fn rating_counts(
        &self,
        department: Option<&str>,
        approved: bool,
    ) -> Result<BTreeMap<i32, u64>, StoreError> {
        self.aggregator.rating_counts(&self.host, department, approved)
    }

    pub fn rating_stats(
        &self,
        department: Option<&str>,
        approved: bool,
    ) -> Result<RatingStats, StoreError> {
        self.aggregator.rating_stats(&self.host, department, approved)
    }
}
