//! Sliced 1-Wasserstein distance.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

use super::{SamplePair, TwoSampleMetric};
use crate::error::MetricError;
use crate::random::RandomContext;

/// Default number of random projections.
pub const DEFAULT_NSLICES: usize = 100;

/// 1-Wasserstein distance between two equal-size 1-D samples.
///
/// Sorts both slices in place.
pub fn wasserstein_1d(x: &mut [f64], y: &mut [f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    if x.is_empty() {
        return 0.0;
    }
    x.sort_by(|a, b| a.total_cmp(b));
    y.sort_by(|a, b| a.total_cmp(b));
    x.iter().zip(y.iter()).map(|(a, b)| (a - b).abs()).sum::<f64>() / x.len() as f64
}

/// Mean 1-Wasserstein distance over random unit directions.
#[derive(Debug, Clone)]
pub struct SlicedWasserstein {
    nslices: usize,
}

impl SlicedWasserstein {
    /// Average over `nslices` directions.
    pub fn new(nslices: usize) -> Self {
        Self { nslices }
    }

    /// Number of directions.
    pub fn nslices(&self) -> usize {
        self.nslices
    }
}

impl Default for SlicedWasserstein {
    fn default() -> Self {
        Self::new(DEFAULT_NSLICES)
    }
}

fn random_direction(ndims: usize, rng: &mut RandomContext) -> DVector<f64> {
    loop {
        let v = DVector::from_fn(ndims, |_, _| rng.sample::<f64, _>(StandardNormal));
        let norm = v.norm();
        if norm > 0.0 {
            return v / norm;
        }
    }
}

fn project(samples: &DMatrix<f64>, direction: &DVector<f64>) -> Vec<f64> {
    (samples * direction).iter().copied().collect()
}

impl TwoSampleMetric for SlicedWasserstein {
    fn column(&self) -> &str {
        "sw_mean"
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

        let total: f64 = (0..self.nslices)
            .map(|_| {
                let direction = random_direction(x.ncols(), rng);
                wasserstein_1d(&mut project(&x, &direction), &mut project(&y, &direction))
            })
            .sum();
        Ok(total / self.nslices as f64)
    }
}
