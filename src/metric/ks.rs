//! Kolmogorov-Smirnov statistic, averaged over dimensions.

use super::{SamplePair, TwoSampleMetric};
use crate::error::MetricError;
use crate::random::RandomContext;

/// Two-sample KS statistic `sup |F_x - F_y|`.
///
/// Sorts both slices in place. Returns 0 when either side is empty.
pub fn ks_statistic(x: &mut [f64], y: &mut [f64]) -> f64 {
    if x.is_empty() || y.is_empty() {
        return 0.0;
    }
    x.sort_by(|a, b| a.total_cmp(b));
    y.sort_by(|a, b| a.total_cmp(b));

    let (n, m) = (x.len() as f64, y.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < x.len() && j < y.len() {
        let v = x[i].min(y[j]);
        while i < x.len() && x[i] <= v {
            i += 1;
        }
        while j < y.len() && y[j] <= v {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }
    d
}

/// Per-dimension KS statistic, averaged over dimensions.
#[derive(Debug, Clone, Default)]
pub struct KsMean;

impl TwoSampleMetric for KsMean {
    fn column(&self) -> &str {
        "ks_mean"
    }

    fn batch_statistic(
        &self,
        pair: &SamplePair<'_>,
        batch_size: usize,
        rng: &mut RandomContext,
    ) -> Result<f64, MetricError> {
        let x = pair.reference.sample(batch_size, rng);
        let y = pair.second().sample(batch_size, rng);
        if x.ncols() != y.ncols() {
            return Err(MetricError::DimensionMismatch {
                expected: x.ncols(),
                actual: y.ncols(),
            });
        }

        let ndims = x.ncols();
        let total: f64 = (0..ndims)
            .map(|j| {
                let mut xs: Vec<f64> = x.column(j).iter().copied().collect();
                let mut ys: Vec<f64> = y.column(j).iter().copied().collect();
                ks_statistic(&mut xs, &mut ys)
            })
            .sum();
        Ok(total / ndims as f64)
    }
}
