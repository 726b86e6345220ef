//! Distributions compared by the two-sample statistics.
//!
//! The solver only needs two capabilities: build a (possibly perturbed)
//! distribution from a seed, and draw samples from it. Likelihood-ratio
//! statistics additionally need point densities.

mod mixture;

use nalgebra::DMatrix;

use crate::config::MixtureConfig;
use crate::error::MetricError;
use crate::random::RandomContext;
use crate::types::Perturbation;

pub use mixture::{MixtureFactory, MixtureGaussian};

/// A sampleable distribution over `R^ndims`.
pub trait Distribution: Send + Sync {
    /// Dimension of the sample space.
    fn ndims(&self) -> usize;

    /// Draw `n` points, one per row.
    fn sample(&self, n: usize, rng: &mut RandomContext) -> DMatrix<f64>;

    /// Log density at `x` (length `ndims`).
    fn log_prob(&self, x: &[f64]) -> f64;
}

/// Builds reference and perturbed distributions.
///
/// Two calls with the same `seed` must share every random parameter, so that
/// a zero perturbation reproduces the reference exactly.
pub trait DistributionFactory {
    /// Distribution type produced.
    type Output: Distribution;

    /// Build a mixture of shape `mixture`, perturbed by `perturbation`.
    fn make_mixture(
        &self,
        mixture: &MixtureConfig,
        perturbation: Perturbation,
        seed: u64,
    ) -> Result<Self::Output, MetricError>;
}
