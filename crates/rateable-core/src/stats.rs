//! Histogram and percentage arithmetic shared by the aggregator.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::types::RatingStats;

/// Zero-fill observed value counts across `range`.
///
/// Observed values outside the range (rows written under older bounds) are
/// not reported.
pub fn fill_counts(
    observed: impl IntoIterator<Item = (i32, u64)>,
    range: RangeInclusive<i32>,
) -> BTreeMap<i32, u64> {
    let observed: BTreeMap<i32, u64> = observed.into_iter().collect();
    range
        .map(|value| (value, observed.get(&value).copied().unwrap_or(0)))
        .collect()
}

/// Whole-percent share of `count` in `total`, rounding halves up.
pub fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    // Exact integer form of round(count / total * 100) for non-negative inputs.
    let scaled = u128::from(count) * 200 + u128::from(total);
    (scaled / (u128::from(total) * 2)) as u32
}

/// Build the full stats block from a zero-filled histogram.
pub fn stats_from_counts(counts: BTreeMap<i32, u64>) -> RatingStats {
    let total: u64 = counts.values().sum();
    let percentages = counts
        .iter()
        .map(|(&value, &count)| (value, percentage(count, total)))
        .collect();

    RatingStats {
        counts,
        percentages,
        total,
    }
}

/// Round an average to `places` decimal places, halves away from zero.
pub fn round_average(average: Option<f64>, places: u32) -> Option<f64> {
    average.map(|value| {
        let factor = 10f64.powi(places as i32);
        (value * factor).round() / factor
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_counts_zero_fills_range() {
        let counts = fill_counts(vec![(2, 3), (5, 1)], 1..=5);
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[&1], 0);
        assert_eq!(counts[&2], 3);
        assert_eq!(counts[&5], 1);
    }

    #[test]
    fn test_fill_counts_drops_out_of_range_values() {
        let counts = fill_counts(vec![(9, 4), (3, 1)], 1..=5);
        assert_eq!(counts.values().sum::<u64>(), 1);
        assert!(!counts.contains_key(&9));
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(1, 3), 33); // 33.33
        assert_eq!(percentage(2, 3), 67); // 66.67
        assert_eq!(percentage(1, 200), 1); // 0.5
        assert_eq!(percentage(0, 10), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn test_percentage_of_empty_total_is_zero() {
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_stats_from_counts() {
        let stats = stats_from_counts(fill_counts(vec![(4, 1), (5, 3)], 1..=5));
        assert_eq!(stats.total, 4);
        assert_eq!(stats.percentages[&5], 75);
        assert_eq!(stats.percentages[&4], 25);
        assert_eq!(stats.percentages[&1], 0);
    }

    #[test]
    fn test_stats_all_zero_when_empty() {
        let stats = stats_from_counts(fill_counts(Vec::new(), 1..=5));
        assert_eq!(stats.total, 0);
        assert!(stats.percentages.values().all(|&p| p == 0));
        assert_eq!(stats.counts.len(), 5);
    }

    #[test]
    fn test_round_average() {
        assert_eq!(round_average(Some(4.666_666), 2), Some(4.67));
        assert_eq!(round_average(Some(3.5), 0), Some(4.0));
        assert_eq!(round_average(None, 2), None);
    }
}
