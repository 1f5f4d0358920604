//! In-memory `ReviewStore`.
//!
//! Every write takes the single write lock for its whole duration, which
//! makes review + rating writes atomic with respect to other callers.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{
    GroupKey, NewRating, NewReview, RatingAggregate, RatingGroup, RatingQuery, RatingWrite,
    ReviewChanges, ReviewOrder, ReviewQuery, ReviewStore, SortOrder, StoreError,
};
use crate::types::{HostRef, Rating, RatingId, Review, ReviewId};

#[derive(Default)]
struct Tables {
    last_review_id: u64,
    last_rating_id: u64,
    /// Review rows; `ratings` is always `None` here
    reviews: BTreeMap<ReviewId, Review>,
    ratings: BTreeMap<RatingId, Rating>,
    /// Rating ids per review, in insertion order
    by_review: BTreeMap<ReviewId, Vec<RatingId>>,
}

impl Tables {
    fn ratings_of(&self, review_id: ReviewId) -> impl Iterator<Item = &Rating> {
        self.by_review
            .get(&review_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.ratings.get(id))
    }

    fn with_ratings(&self, review: &Review) -> Review {
        let mut loaded = review.clone();
        loaded.ratings = Some(self.ratings_of(review.id).cloned().collect());
        loaded
    }

    fn review_matches(&self, query: &ReviewQuery, review: &Review) -> bool {
        query.matches_row(review)
            && query
                .rating_value
                .map_or(true, |v| self.ratings_of(review.id).any(|r| r.value == v))
    }

    /// Ratings of every review passing `query.reviews`, then the rating filters.
    ///
    /// A `review_id` filter goes straight to that review's rows.
    fn matching_ratings<'a>(&'a self, query: &'a RatingQuery) -> impl Iterator<Item = &'a Rating> {
        let reviews: Box<dyn Iterator<Item = &'a Review> + 'a> = match query.review_id {
            Some(id) => Box::new(self.reviews.get(&id).into_iter()),
            None => Box::new(self.reviews.values()),
        };
        reviews
            .filter(move |review| self.review_matches(&query.reviews, review))
            .flat_map(move |review| self.ratings_of(review.id))
            .filter(move |rating| query.matches_rating(rating))
    }

    fn add_rating(&mut self, review_id: ReviewId, new_rating: NewRating, now: DateTime<Utc>) {
        self.last_rating_id += 1;
        let id = RatingId(self.last_rating_id);
        self.ratings.insert(
            id,
            Rating {
                id,
                review_id,
                key: new_rating.key,
                value: new_rating.value,
                created_at: now,
                updated_at: now,
            },
        );
        self.by_review.entry(review_id).or_default().push(id);
    }
}

/// Thread-safe in-memory review store with monotonically increasing ids.
#[derive(Default)]
pub struct MemoryReviewStore {
    tables: RwLock<Tables>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of review rows across all hosts.
    pub fn review_count(&self) -> usize {
        self.tables.read().reviews.len()
    }

    /// Number of rating rows across all reviews.
    pub fn rating_count(&self) -> usize {
        self.tables.read().ratings.len()
    }
}

fn ensure_unique_keys<'a>(keys: impl Iterator<Item = &'a str>) -> Result<(), StoreError> {
    let mut seen = std::collections::HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(StoreError::Conflict(format!("duplicate rating key '{}'", key)));
        }
    }
    Ok(())
}

impl ReviewStore for MemoryReviewStore {
    fn insert_review(
        &self,
        review: NewReview,
        ratings: Vec<NewRating>,
    ) -> Result<Review, StoreError> {
        ensure_unique_keys(ratings.iter().map(|r| r.key.as_str()))?;

        let mut tables = self.tables.write();
        let now = Utc::now();

        tables.last_review_id += 1;
        let id = ReviewId(tables.last_review_id);

        let row = Review {
            id,
            host: review.host,
            author_id: review.author_id,
            text: review.text,
            department: review.department,
            recommend: review.recommend,
            approved: review.approved,
            created_at: now,
            updated_at: now,
            ratings: None,
        };

        for new_rating in ratings {
            tables.add_rating(id, new_rating, now);
        }

        let loaded = tables.with_ratings(&row);
        tables.reviews.insert(id, row);
        Ok(loaded)
    }

    fn find_review(
        &self,
        host: &HostRef,
        id: ReviewId,
        with_ratings: bool,
    ) -> Result<Option<Review>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .reviews
            .get(&id)
            .filter(|review| &review.host == host)
            .map(|review| {
                if with_ratings {
                    tables.with_ratings(review)
                } else {
                    review.clone()
                }
            }))
    }

    fn update_review(
        &self,
        id: ReviewId,
        changes: ReviewChanges,
        ratings: Vec<RatingWrite>,
    ) -> Result<Review, StoreError> {
        let mut tables = self.tables.write();

        if !tables.reviews.contains_key(&id) {
            return Err(StoreError::NotFound(id.to_string()));
        }

        // Validate every rating write before touching any row.
        let created_keys: Vec<&str> = ratings
            .iter()
            .filter_map(|write| match write {
                RatingWrite::Create(new_rating) => Some(new_rating.key.as_str()),
                RatingWrite::Update { .. } => None,
            })
            .collect();
        ensure_unique_keys(created_keys.iter().copied())?;
        for key in &created_keys {
            if tables.ratings_of(id).any(|r| r.key == *key) {
                return Err(StoreError::Conflict(format!(
                    "rating key '{}' already exists on {}",
                    key, id
                )));
            }
        }
        for write in &ratings {
            if let RatingWrite::Update { id: rating_id, .. } = write {
                match tables.ratings.get(rating_id) {
                    Some(rating) if rating.review_id == id => {}
                    _ => return Err(StoreError::NotFound(rating_id.to_string())),
                }
            }
        }

        let now = Utc::now();
        for write in ratings {
            match write {
                RatingWrite::Update { id: rating_id, value } => {
                    if let Some(rating) = tables.ratings.get_mut(&rating_id) {
                        rating.value = value;
                        rating.updated_at = now;
                    }
                }
                RatingWrite::Create(new_rating) => tables.add_rating(id, new_rating, now),
            }
        }

        let row = tables
            .reviews
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(text) = changes.text {
            row.text = Some(text);
        }
        if let Some(department) = changes.department {
            row.department = department;
        }
        if let Some(recommend) = changes.recommend {
            row.recommend = recommend;
        }
        if let Some(approved) = changes.approved {
            row.approved = approved;
        }
        row.updated_at = now;

        let row = row.clone();
        Ok(tables.with_ratings(&row))
    }

    fn delete_review(&self, id: ReviewId) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.reviews.remove(&id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        for rating_id in tables.by_review.remove(&id).unwrap_or_default() {
            tables.ratings.remove(&rating_id);
        }
        Ok(())
    }

    fn find_reviews(
        &self,
        query: &ReviewQuery,
        with_ratings: bool,
    ) -> Result<Vec<Review>, StoreError> {
        let tables = self.tables.read();

        let mut rows: Vec<&Review> = tables
            .reviews
            .values()
            .filter(|review| tables.review_matches(query, review))
            .collect();

        if let Some((column, direction)) = query.order {
            rows.sort_by(|a, b| {
                let ordering = match column {
                    ReviewOrder::CreatedAt => {
                        a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
                    }
                    ReviewOrder::Id => a.id.cmp(&b.id),
                };
                match direction {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|review| {
                if with_ratings {
                    tables.with_ratings(review)
                } else {
                    review.clone()
                }
            })
            .collect())
    }

    fn count_reviews(&self, query: &ReviewQuery) -> Result<u64, StoreError> {
        let tables = self.tables.read();
        let count = tables
            .reviews
            .values()
            .filter(|review| tables.review_matches(query, review))
            .count();
        Ok(count as u64)
    }

    fn find_ratings(&self, query: &RatingQuery) -> Result<Vec<Rating>, StoreError> {
        let tables = self.tables.read();
        Ok(tables.matching_ratings(query).cloned().collect())
    }

    fn aggregate_ratings(
        &self,
        query: &RatingQuery,
        group: RatingGroup,
    ) -> Result<Vec<RatingAggregate>, StoreError> {
        let tables = self.tables.read();

        let mut groups: BTreeMap<GroupKey, (u64, i64)> = BTreeMap::new();
        for rating in tables.matching_ratings(query) {
            let key = match group {
                RatingGroup::All => GroupKey::All,
                RatingGroup::Key => GroupKey::Key(rating.key.clone()),
                RatingGroup::Value => GroupKey::Value(rating.value),
            };
            let entry = groups.entry(key).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += i64::from(rating.value);
        }

        Ok(groups
            .into_iter()
            .map(|(group, (count, sum))| RatingAggregate { group, count, sum })
            .collect())
    }
}
