use std::path::PathBuf;
use std::sync::Arc;

use rateable_core::{
    HostRef, MemoryReviewStore, RateableError, RatingSchema, ReviewAggregator, ReviewId,
    ReviewInput, ReviewRateable, ReviewRateableService, ReviewUpdate, Reviewable,
    DEFAULT_DEPARTMENT,
};

fn config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/review-rateable.yaml")
}

fn rateable(schema: RatingSchema, host: HostRef) -> ReviewRateable<MemoryReviewStore> {
    let aggregator =
        ReviewAggregator::new(Arc::new(MemoryReviewStore::new()), Arc::new(schema)).unwrap();
    host.rateable(&aggregator)
}

#[test]
fn test_full_review_persists_every_rating() {
    let business = rateable(RatingSchema::default(), HostRef::new("business", 1));

    let review = business
        .add_review(
            ReviewInput::new()
                .department(DEFAULT_DEPARTMENT)
                .approved(true)
                .rating("overall", 5)
                .rating("customer_service", 4)
                .rating("quality", 5)
                .rating("price", 3),
            Some("1"),
        )
        .unwrap();

    assert_eq!(review.ratings().len(), 4);
    assert_eq!(business.ratings_for_review(review.id).unwrap().len(), 4);
    assert_eq!(business.average_rating("overall", true).unwrap(), Some(5.0));
}

#[test]
fn test_ten_point_config_clamps_high_values() {
    let schema = RatingSchema::from_file(config_path()).unwrap();
    assert_eq!(schema, RatingSchema::ten_point());

    let business = rateable(schema, HostRef::new("business", 2));
    let review = business
        .add_review(ReviewInput::new().rating("overall", 99), None)
        .unwrap();

    assert_eq!(review.rating("overall").map(|r| r.value), Some(10));
}

#[test]
fn test_update_changes_value_in_place() {
    let business = rateable(RatingSchema::default(), HostRef::new("business", 3));
    let review = business
        .add_review(
            ReviewInput::new().approved(true).rating("overall", 3),
            None,
        )
        .unwrap();
    let before = business.ratings_for_review(review.id).unwrap();

    let updated = business
        .update_review(
            review.id,
            ReviewUpdate::new().text("Changed my mind").rating("overall", 5),
        )
        .unwrap();
    assert!(updated);

    let after = business.ratings_for_review(review.id).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].value, 5);

    let reviews = business.get_reviews(true, false).unwrap();
    assert_eq!(reviews[0].text.as_deref(), Some("Changed my mind"));
    assert_eq!(business.average_rating("overall", true).unwrap(), Some(5.0));
}

#[test]
fn test_delete_removes_ratings() {
    let business = rateable(RatingSchema::default(), HostRef::new("business", 4));
    let review = business
        .add_review(
            ReviewInput::new().approved(true).rating("overall", 4).rating("price", 2),
            None,
        )
        .unwrap();

    assert!(business.delete_review(review.id).unwrap());
    assert!(business.ratings_for_review(review.id).unwrap().is_empty());
    assert_eq!(business.total_reviews(true).unwrap(), 0);
    assert_eq!(business.overall_average_rating(true).unwrap(), None);
}

#[test]
fn test_approval_gates_aggregates() {
    let business = rateable(RatingSchema::default(), HostRef::new("business", 5));
    let pending = business
        .add_review(ReviewInput::new().rating("overall", 2), None)
        .unwrap();
    business
        .add_review(
            ReviewInput::new().approved(true).rating("overall", 4),
            None,
        )
        .unwrap();

    assert_eq!(business.total_reviews(true).unwrap(), 1);
    assert_eq!(business.total_reviews(false).unwrap(), 1);
    assert_eq!(business.average_rating("overall", true).unwrap(), Some(4.0));

    assert!(business.approve_review(pending.id).unwrap());
    assert_eq!(business.total_reviews(true).unwrap(), 2);
    assert_eq!(business.average_rating("overall", true).unwrap(), Some(3.0));
    assert_eq!(business.rating_counts(None, true).unwrap()[&2], 1);
}

#[test]
fn test_unknown_review_ids_are_soft_failures() {
    let business = rateable(RatingSchema::default(), HostRef::new("business", 6));
    let missing = ReviewId(9_999);

    assert!(!business.update_review(missing, ReviewUpdate::new().approved(true)).unwrap());
    assert!(!business.approve_review(missing).unwrap());
    assert!(!business.delete_review(missing).unwrap());
    assert!(business.ratings_for_review(missing).unwrap().is_empty());
}

#[test]
fn test_department_totals_and_listing() {
    let business = rateable(RatingSchema::default(), HostRef::new("business", 7));
    for department in ["sales", "sales", "support"] {
        business
            .add_review(
                ReviewInput::new().department(department).approved(true),
                None,
            )
            .unwrap();
    }

    assert_eq!(business.total_department_reviews("sales", true).unwrap(), 2);
    assert_eq!(business.total_department_reviews("support", true).unwrap(), 1);
    assert_eq!(
        business
            .get_reviews_by_department("sales", true, true)
            .unwrap()
            .len(),
        2
    );
    assert!(business
        .get_reviews_by_department(DEFAULT_DEPARTMENT, true, true)
        .unwrap()
        .is_empty());
}

#[test]
fn test_service_requires_model() {
    let aggregator = ReviewAggregator::new(
        Arc::new(MemoryReviewStore::new()),
        Arc::new(RatingSchema::default()),
    )
    .unwrap();
    let mut service = ReviewRateableService::new(aggregator);

    assert!(matches!(
        service.rating_stats(None, true),
        Err(RateableError::NotConfigured)
    ));

    service.set_model(&HostRef::new("location", "north"));
    service
        .add_review(ReviewInput::new().approved(true).rating("overall", 5), None)
        .unwrap();
    let stats = service.rating_stats(None, true).unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.percentages[&5], 100);
}

#[test]
fn test_get_reviews_returns_only_matching_approval() {
    let business = rateable(RatingSchema::default(), HostRef::new("business", 8));
    let approved = business
        .add_review(ReviewInput::new().approved(true).rating("overall", 4), None)
        .unwrap();
    let pending = business
        .add_review(ReviewInput::new().approved(false).rating("overall", 2), None)
        .unwrap();

    for with_ratings in [true, false] {
        let published: Vec<ReviewId> = business
            .get_reviews(true, with_ratings)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        let queued: Vec<ReviewId> = business
            .get_reviews(false, with_ratings)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(published, vec![approved.id]);
        assert_eq!(queued, vec![pending.id]);
    }
}
