//! JSON summary printed by `stats` and `demo`.

use serde::Serialize;
use std::collections::BTreeMap;

use rateable_core::{round_average, HostRef, RatingStats, ReviewRateable, ReviewStore, StoreError};

pub struct SummaryOptions {
    /// Histogram department; `None` covers every department
    pub department: Option<String>,
    pub approved: bool,
    pub precision: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HostSummary {
    pub host: HostRef,
    pub approved: bool,
    pub department: Option<String>,
    pub total_reviews: u64,
    pub overall_average: Option<f64>,
    pub average_ratings: BTreeMap<String, f64>,
    pub stats: RatingStats,
}

impl HostSummary {
    pub fn build<S: ReviewStore>(
        host: &ReviewRateable<S>,
        options: &SummaryOptions,
    ) -> Result<Self, StoreError> {
        let round = |value: Option<f64>| match options.precision {
            Some(places) => round_average(value, places),
            None => value,
        };

        let average_ratings = host
            .average_ratings(options.approved)?
            .into_iter()
            .filter_map(|(key, average)| round(Some(average)).map(|v| (key, v)))
            .collect();

        Ok(Self {
            host: host.host().clone(),
            approved: options.approved,
            department: options.department.clone(),
            total_reviews: host.total_reviews(options.approved)?,
            overall_average: round(host.overall_average_rating(options.approved)?),
            average_ratings,
            stats: host.rating_stats(options.department.as_deref(), options.approved)?,
        })
    }
}
