//! Service adapter: one indirection point callers can hold onto while the
//! bound host changes.
//!
//! The bound host lives on the adapter instance. Calling an operation before
//! [`ReviewRateableService::set_model`] fails with
//! [`RateableError::NotConfigured`]. Callers that already know the host can
//! use [`ReviewAggregator`] directly and pass it per call.

use std::collections::BTreeMap;

use crate::aggregator::ReviewAggregator;
use crate::facade::Reviewable;
use crate::store::{ReviewQuery, ReviewStore};
use crate::types::{
    HostRef, Rating, RatingStats, Review, ReviewId, ReviewInput, ReviewUpdate,
};
use crate::RateableError;

pub struct ReviewRateableService<S> {
    aggregator: ReviewAggregator<S>,
    model: Option<HostRef>,
}

impl<S: ReviewStore> ReviewRateableService<S> {
    pub fn new(aggregator: ReviewAggregator<S>) -> Self {
        Self {
            aggregator,
            model: None,
        }
    }

    /// Bind the host every following call operates on.
    pub fn set_model<M: Reviewable + ?Sized>(&mut self, model: &M) -> &mut Self {
        self.model = Some(model.review_host());
        self
    }

    pub fn clear_model(&mut self) {
        self.model = None;
    }

    pub fn model(&self) -> Result<&HostRef, RateableError> {
        self.model.as_ref().ok_or(RateableError::NotConfigured)
    }

    pub fn add_review(
        &self,
        input: ReviewInput,
        author_id: Option<&str>,
    ) -> Result<Review, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.add_review(host, input, author_id)?)
    }

    pub fn update_review(&self, review_id: ReviewId, update: ReviewUpdate) -> Result<bool, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.update_review(host, review_id, update)?)
    }

    pub fn approve_review(&self, review_id: ReviewId) -> Result<bool, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.approve_review(host, review_id)?)
    }

    pub fn delete_review(&self, review_id: ReviewId) -> Result<bool, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.delete_review(host, review_id)?)
    }

    pub fn average_rating(&self, key: &str, approved: bool) -> Result<Option<f64>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.average_rating(host, key, approved)?)
    }

    pub fn average_ratings(&self, approved: bool) -> Result<BTreeMap<String, f64>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.average_ratings(host, approved)?)
    }

    pub fn average_rating_by_department(
        &self,
        department: &str,
        key: &str,
        approved: bool,
    ) -> Result<Option<f64>, RateableError> {
        let host = self.model()?;
        Ok(self
            .aggregator
            .average_rating_by_department(host, department, key, approved)?)
    }

    pub fn average_ratings_by_department(
        &self,
        department: &str,
        approved: bool,
    ) -> Result<BTreeMap<String, f64>, RateableError> {
        let host = self.model()?;
        Ok(self
            .aggregator
            .average_ratings_by_department(host, department, approved)?)
    }

    pub fn overall_average_rating(&self, approved: bool) -> Result<Option<f64>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.overall_average_rating(host, approved)?)
    }

    pub fn get_reviews(&self, approved: bool, with_ratings: bool) -> Result<Vec<Review>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.get_reviews(host, approved, with_ratings)?)
    }

    pub fn get_reviews_by_department(
        &self,
        department: &str,
        approved: bool,
        with_ratings: bool,
    ) -> Result<Vec<Review>, RateableError> {
        let host = self.model()?;
        Ok(self
            .aggregator
            .get_reviews_by_department(host, department, approved, with_ratings)?)
    }

    pub fn get_reviews_by_rating(
        &self,
        star_value: i32,
        department: Option<&str>,
        approved: bool,
        with_ratings: bool,
    ) -> Result<Vec<Review>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.get_reviews_by_rating(
            host,
            star_value,
            department,
            approved,
            with_ratings,
        )?)
    }

    pub fn recent_reviews(&self, limit: usize, approved: bool) -> Result<Vec<Review>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.recent_reviews(host, limit, approved)?)
    }

    pub fn author_reviews(
        &self,
        author_id: &str,
        limit: usize,
        approved: bool,
    ) -> Result<Vec<Review>, RateableError> {
        let host = self.model()?;
        Ok(self
            .aggregator
            .author_reviews(host, author_id, limit, approved)?)
    }

    pub fn ratings_for_review(&self, review_id: ReviewId) -> Result<Vec<Rating>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.ratings_for_review(host, review_id)?)
    }

    pub fn find_reviews(
        &self,
        query: ReviewQuery,
        with_ratings: bool,
    ) -> Result<Vec<Review>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.find_reviews(host, query, with_ratings)?)
    }

    pub fn total_reviews(&self, approved: bool) -> Result<u64, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.total_reviews(host, approved)?)
    }

    pub fn total_department_reviews(&self, department: &str, approved: bool) -> Result<u64, RateableError> {
        let host = self.model()?;
        Ok(self
            .aggregator
            .total_department_reviews(host, department, approved)?)
    }

    pub fn rating_counts(
        &self,
        department: Option<&str>,
        approved: bool,
    ) -> Result<BTreeMap<i32, u64>, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.rating_counts(host, department, approved)?)
    }

    pub fn rating_stats(
        &self,
        department: Option<&str>,
        approved: bool,
    ) -> Result<RatingStats, RateableError> {
        let host = self.model()?;
        Ok(self.aggregator.rating_stats(host, department, approved)?)
    }
}
