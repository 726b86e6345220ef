//! Log-likelihood-ratio statistic.
//!
//! For a batch `y_1..y_n` the statistic is
//!
//! ```text
//! t = 2 Σ_i [log p_pert(y_i) - log p_ref(y_i)]
//! ```
//!
//! Under the null hypothesis `y` is drawn from the reference and `t`
//! concentrates around `-2 n KL(ref || pert)`; under the alternative `y` is
//! drawn from the perturbed distribution and `t` concentrates around
//! `2 n KL(pert || ref)`. Thresholds are read off the null distribution.

use super::{SamplePair, TwoSampleMetric};
use crate::error::MetricError;
use crate::random::RandomContext;

/// Likelihood-ratio statistic with exact mixture densities.
#[derive(Debug, Clone, Default)]
pub struct LikelihoodRatio;

impl TwoSampleMetric for LikelihoodRatio {
    fn column(&self) -> &str {
        "lr_statistic"
    }

    fn batch_statistic(
        &self,
        pair: &SamplePair<'_>,
        batch_size: usize,
        rng: &mut RandomContext,
    ) -> Result<f64, MetricError> {
        let ndims = pair.reference.ndims();
        if pair.perturbed.ndims() != ndims {
            return Err(MetricError::DimensionMismatch {
                expected: ndims,
                actual: pair.perturbed.ndims(),
            });
        }

        let y = pair.second().sample(batch_size, rng);
        let mut row = vec![0.0; ndims];
        let mut total = 0.0;
        for i in 0..y.nrows() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = y[(i, j)];
            }
            total += pair.perturbed.log_prob(&row) - pair.reference.log_prob(&row);
        }
        Ok(2.0 * total)
    }
}
