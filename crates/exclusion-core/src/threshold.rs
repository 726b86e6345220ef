//! Threshold tiers and empirical-quantile threshold tables.
//!
//! For the likelihood-ratio searches the decision threshold at confidence
//! level `cl` is read off a freshly sampled null-hypothesis statistic:
//!
//! ```text
//! value  = sorted(null)[floor(n * cl)]
//! bounds = (floor(cl * n), floor((1 - cl) * n))
//! ```
//!
//! No interpolation is applied; this is the order statistic at the floored
//! index, which keeps thresholds reproducible across runs that store them.

use serde::{Deserialize, Serialize};

/// One confidence-level target searched by the bisection solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTier {
    /// Confidence level in `(0, 1)`.
    pub confidence_level: f64,
    /// Lower/upper order-statistic indices the value was read from.
    ///
    /// Present for tiers derived from a null sample; `None` for tiers
    /// supplied directly in configuration.
    pub index_bounds: Option<(usize, usize)>,
    /// Metric value the statistic is compared against.
    ///
    /// May be non-finite when the null sample is degenerate.
    #[serde(with = "crate::lossy::float")]
    pub value: f64,
}

impl ThresholdTier {
    /// Tier with a precomputed threshold value.
    pub fn new(confidence_level: f64, value: f64) -> Self {
        Self {
            confidence_level,
            index_bounds: None,
            value,
        }
    }
}

/// Order-statistic index for confidence level `cl` in a sample of size `n`.
///
/// Clamped to `n - 1` so that `cl` values that round up to `n` stay in range.
#[inline]
pub fn quantile_index(n: usize, confidence_level: f64) -> usize {
    debug_assert!(n > 0, "n must be positive");
    ((n as f64 * confidence_level).floor() as usize).min(n - 1)
}

/// Empirical quantile of an ascending-sorted slice.
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn empirical_quantile_sorted(sorted: &[f64], confidence_level: f64) -> f64 {
    assert!(!sorted.is_empty(), "Cannot compute quantile of empty slice");
    sorted[quantile_index(sorted.len(), confidence_level)]
}

/// Build one tier per confidence level from a null-hypothesis sample.
///
/// Tiers are returned in the order of `confidence_levels`.
///
/// # Panics
///
/// Panics if `null_values` is empty.
pub fn build_threshold_table(null_values: &[f64], confidence_levels: &[f64]) -> Vec<ThresholdTier> {
    assert!(
        !null_values.is_empty(),
        "Cannot build thresholds from an empty null sample"
    );

    let mut sorted = null_values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();

    confidence_levels
        .iter()
        .map(|&cl| {
            let lower = (cl * n as f64).floor() as usize;
            let upper = ((1.0 - cl) * n as f64).floor() as usize;
            ThresholdTier {
                confidence_level: cl,
                index_bounds: Some((lower, upper)),
                value: empirical_quantile_sorted(&sorted, cl),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_index_floor() {
        assert_eq!(quantile_index(100, 0.95), 95);
        assert_eq!(quantile_index(100, 0.99), 99);
        assert_eq!(quantile_index(10, 0.95), 9);
        assert_eq!(quantile_index(10, 0.5), 5);
    }

    #[test]
    fn test_quantile_index_clamped() {
        assert_eq!(quantile_index(10, 1.0), 9);
    }

    #[test]
    fn test_threshold_table_values() {
        // 0, 1, ..., 99 shuffled deterministically
        let null: Vec<f64> = (0..100).map(|i| ((i * 37) % 100) as f64).collect();
        let table = build_threshold_table(&null, &[0.95, 0.99]);

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].confidence_level, 0.95);
        assert_eq!(table[0].value, 95.0);
        assert_eq!(table[0].index_bounds, Some((95, 5)));
        assert_eq!(table[1].value, 99.0);
        assert_eq!(table[1].index_bounds, Some((99, 1)));
    }

    #[test]
    fn test_threshold_table_preserves_level_order() {
        let null: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let table = build_threshold_table(&null, &[0.9, 0.5]);
        assert_eq!(table[0].value, 18.0);
        assert_eq!(table[1].value, 10.0);
    }

    #[test]
    fn test_threshold_table_does_not_mutate_input() {
        let null = vec![3.0, 1.0, 2.0];
        let _ = build_threshold_table(&null, &[0.5]);
        assert_eq!(null, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "empty null sample")]
    fn test_threshold_table_empty_panics() {
        let _ = build_threshold_table(&[], &[0.95]);
    }

    #[test]
    fn test_static_tier_has_no_bounds() {
        let tier = ThresholdTier::new(0.99, 4.2);
        assert!(tier.index_bounds.is_none());
        assert_eq!(tier.value, 4.2);
    }

    #[test]
    fn test_degenerate_null_tier_survives_json() {
        let mut null: Vec<f64> = (0..9).map(|i| i as f64).collect();
        null.push(f64::NAN);
        let table = build_threshold_table(&null, &[0.5, 0.99]);
        assert!(table[1].value.is_nan());

        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"NaN\""));
        let back: Vec<ThresholdTier> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], table[0]);
        assert!(back[1].value.is_nan());
        assert_eq!(back[1].index_bounds, Some((9, 0)));
    }

    #[test]
    fn test_plain_number_tier_still_reads() {
        let tier: ThresholdTier =
            serde_json::from_str(r#"{"confidence_level":0.95,"index_bounds":null,"value":1.25}"#)
                .unwrap();
        assert_eq!(tier, ThresholdTier::new(0.95, 1.25));
    }
}
