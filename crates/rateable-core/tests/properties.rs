use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use rateable_core::{
    HostRef, MemoryReviewStore, RatingSchema, ReviewAggregator, ReviewInput, ReviewRateable,
    Reviewable,
};

fn rateable(schema: RatingSchema) -> ReviewRateable<MemoryReviewStore> {
    let aggregator =
        ReviewAggregator::new(Arc::new(MemoryReviewStore::new()), Arc::new(schema)).unwrap();
    HostRef::new("product", 1).rateable(&aggregator)
}

fn rating_map() -> impl Strategy<Value = BTreeMap<String, i32>> {
    let key = prop_oneof![
        Just("overall".to_string()),
        Just("price".to_string()),
        Just("quality".to_string()),
        Just("customer_service".to_string()),
        Just("speed".to_string()),
        "[a-z]{1,8}",
    ];
    prop::collection::btree_map(key, -50i32..50, 0..6)
}

proptest! {
    #[test]
    fn stored_values_stay_within_bounds(min in -5i32..5, span in 0i32..10, ratings in rating_map()) {
        let max = min + span;
        let mut schema = RatingSchema::default();
        schema.min_rating_value = min;
        schema.max_rating_value = max;
        let product = rateable(schema);

        let review = product
            .add_review(ReviewInput { ratings, ..ReviewInput::default() }, None)
            .unwrap();
        for rating in review.ratings() {
            prop_assert!(rating.value >= min && rating.value <= max);
        }
    }

    #[test]
    fn unknown_keys_are_never_stored(ratings in rating_map()) {
        let schema = RatingSchema::default();
        let product = rateable(schema.clone());

        let review = product
            .add_review(ReviewInput { ratings: ratings.clone(), ..ReviewInput::default() }, None)
            .unwrap();

        let expected = ratings
            .keys()
            .filter(|key| schema.allows("default", key))
            .count();
        prop_assert_eq!(review.ratings().len(), expected);
        for rating in review.ratings() {
            prop_assert!(schema.allows("default", &rating.key));
        }
    }

    #[test]
    fn histogram_covers_range_and_sums_to_total(values in prop::collection::vec(1i32..=10, 0..20)) {
        let product = rateable(RatingSchema::ten_point());
        for value in &values {
            product
                .add_review(ReviewInput::new().approved(true).rating("overall", *value), None)
                .unwrap();
        }

        let stats = product.rating_stats(None, true).unwrap();
        prop_assert_eq!(stats.counts.len(), 10);
        prop_assert_eq!(stats.total, values.len() as u64);
        prop_assert_eq!(stats.counts.values().sum::<u64>(), stats.total);

        let percent_sum: u32 = stats.percentages.values().sum();
        if stats.total == 0 {
            prop_assert_eq!(percent_sum, 0);
        } else {
            // Each bucket rounds independently, so the sum may drift by up to
            // half a point per bucket.
            prop_assert!(percent_sum.abs_diff(100) <= 5);
        }
    }

    #[test]
    fn overall_average_is_mean_of_ratings(values in prop::collection::vec((1i32..=5, 1i32..=5), 1..10)) {
        let product = rateable(RatingSchema::default());
        let mut sum = 0i64;
        for (overall, price) in &values {
            product
                .add_review(
                    ReviewInput::new().approved(true).rating("overall", *overall).rating("price", *price),
                    None,
                )
                .unwrap();
            sum += i64::from(*overall + *price);
        }

        let expected = sum as f64 / (values.len() * 2) as f64;
        let average = product.overall_average_rating(true).unwrap().unwrap();
        prop_assert!((average - expected).abs() < 1e-9);
    }
}
