//! Mixture of axis-aligned Gaussians.
//!
//! Parameters are drawn from the seed in a fixed order so that the reference
//! (`eps = 0`) and every perturbed mixture built from the same seed share
//! their base values:
//!
//! 1. `loc   ~ U[0, 1)^(ncomp × ndims) · 10`
//! 2. `loc'  ~ U(loc - eps_loc, loc + eps_loc)`
//! 3. `scale ~ U[0, 1)^(ncomp × ndims)`
//! 4. `scale' ~ U(scale - eps_scale, scale + eps_scale)`
//! 5. `probs ~ U[0, 1)^ncomp`, normalised
//!
//! The perturbation draws happen even when the half-width is zero, which is
//! what keeps steps 3-5 aligned across epsilons.

use std::f64::consts::PI;

use nalgebra::DMatrix;
use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use rand_distr::StandardNormal;

use super::{Distribution, DistributionFactory};
use crate::config::MixtureConfig;
use crate::error::MetricError;
use crate::random::RandomContext;
use crate::types::Perturbation;

/// Smallest component scale. Perturbed scales are reflected at zero and
/// floored here.
pub const MIN_SCALE: f64 = 1e-12;

/// Range of the component locations.
const LOC_RANGE: f64 = 10.0;

/// Gaussian mixture with diagonal components.
#[derive(Debug, Clone)]
pub struct MixtureGaussian {
    loc: DMatrix<f64>,
    scale: DMatrix<f64>,
    weights: Vec<f64>,
    component: WeightedIndex<f64>,
}

impl MixtureGaussian {
    /// Draw a mixture from `seed`, perturbed by `perturbation`.
    pub fn generate(
        mixture: &MixtureConfig,
        perturbation: Perturbation,
        seed: u64,
    ) -> Result<Self, MetricError> {
        let MixtureConfig { ncomp, ndims } = *mixture;
        if ncomp == 0 || ndims == 0 {
            return Err(MetricError::InvalidDistribution {
                message: format!("ncomp={ncomp} and ndims={ndims} must be positive"),
            });
        }

        let mut rng = RandomContext::new(seed);
        let loc = DMatrix::from_fn(ncomp, ndims, |_, _| rng.random::<f64>() * LOC_RANGE);
        let loc = loc.map(|l| uniform_around(&mut rng, l, perturbation.eps_loc));
        let scale = DMatrix::from_fn(ncomp, ndims, |_, _| rng.random::<f64>());
        let scale = scale.map(|s| {
            uniform_around(&mut rng, s, perturbation.eps_scale)
                .abs()
                .max(MIN_SCALE)
        });
        let probs: Vec<f64> = (0..ncomp).map(|_| rng.random::<f64>()).collect();

        Self::from_parts(loc, scale, probs)
    }

    /// Mixture from explicit parameters. `weights` need not be normalised.
    pub fn from_parts(
        loc: DMatrix<f64>,
        scale: DMatrix<f64>,
        weights: Vec<f64>,
    ) -> Result<Self, MetricError> {
        if loc.shape() != scale.shape() || loc.nrows() != weights.len() {
            return Err(MetricError::InvalidDistribution {
                message: format!(
                    "loc {:?}, scale {:?} and {} weights disagree",
                    loc.shape(),
                    scale.shape(),
                    weights.len()
                ),
            });
        }
        if scale.iter().any(|&s| !(s > 0.0)) {
            return Err(MetricError::InvalidDistribution {
                message: "scales must be positive".to_string(),
            });
        }

        let component = WeightedIndex::new(weights.iter().copied()).map_err(|e| {
            MetricError::InvalidDistribution {
                message: format!("invalid mixture weights: {e}"),
            }
        })?;
        let total: f64 = weights.iter().sum();
        let weights = weights.into_iter().map(|w| w / total).collect();

        Ok(Self {
            loc,
            scale,
            weights,
            component,
        })
    }

    /// Number of components.
    pub fn ncomp(&self) -> usize {
        self.loc.nrows()
    }

    /// Component locations, one row per component.
    pub fn loc(&self) -> &DMatrix<f64> {
        &self.loc
    }

    /// Component scales, one row per component.
    pub fn scale(&self) -> &DMatrix<f64> {
        &self.scale
    }

    /// Normalised mixing weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// `U(center - half_width, center + half_width)`, consuming one draw.
fn uniform_around(rng: &mut RandomContext, center: f64, half_width: f64) -> f64 {
    let u: f64 = rng.random();
    center - half_width + 2.0 * half_width * u
}

impl Distribution for MixtureGaussian {
    fn ndims(&self) -> usize {
        self.loc.ncols()
    }

    fn sample(&self, n: usize, rng: &mut RandomContext) -> DMatrix<f64> {
        let ndims = self.ndims();
        let mut out = DMatrix::zeros(n, ndims);
        for i in 0..n {
            let k = rng.sample(&self.component);
            for j in 0..ndims {
                let z: f64 = rng.sample(StandardNormal);
                out[(i, j)] = self.loc[(k, j)] + self.scale[(k, j)] * z;
            }
        }
        out
    }

    fn log_prob(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.ndims());
        let half_log_2pi = 0.5 * (2.0 * PI).ln();

        let component_logs: Vec<f64> = (0..self.ncomp())
            .map(|k| {
                let mut lp = self.weights[k].ln();
                for (j, &xj) in x.iter().enumerate() {
                    let sigma = self.scale[(k, j)];
                    let z = (xj - self.loc[(k, j)]) / sigma;
                    lp -= 0.5 * z * z + sigma.ln() + half_log_2pi;
                }
                lp
            })
            .collect();

        log_sum_exp(&component_logs)
    }
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Factory for [`MixtureGaussian`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MixtureFactory;

impl DistributionFactory for MixtureFactory {
    type Output = MixtureGaussian;

    fn make_mixture(
        &self,
        mixture: &MixtureConfig,
        perturbation: Perturbation,
        seed: u64,
    ) -> Result<MixtureGaussian, MetricError> {
        MixtureGaussian::generate(mixture, perturbation, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> MixtureConfig {
        MixtureConfig { ncomp: 3, ndims: 4 }
    }

    #[test]
    fn test_zero_perturbation_matches_reference() {
        let a = MixtureGaussian::generate(&shape(), Perturbation::NONE, 11).unwrap();
        let b = MixtureGaussian::generate(&shape(), Perturbation::NONE, 11).unwrap();
        assert_eq!(a.loc(), b.loc());
        assert_eq!(a.scale(), b.scale());
        assert_eq!(a.weights(), b.weights());
    }

    #[test]
    fn test_perturbation_is_bounded_and_aligned() {
        let reference = MixtureGaussian::generate(&shape(), Perturbation::NONE, 5).unwrap();
        let perturbation = Perturbation {
            eps_loc: 0.2,
            eps_scale: 0.0,
        };
        let perturbed = MixtureGaussian::generate(&shape(), perturbation, 5).unwrap();

        for (a, b) in reference.loc().iter().zip(perturbed.loc().iter()) {
            assert!((a - b).abs() <= 0.2 + 1e-12);
        }
        // Scale and weights are drawn after the location perturbation and
        // must not shift
        assert_eq!(reference.scale(), perturbed.scale());
        assert_eq!(reference.weights(), perturbed.weights());
    }

    #[test]
    fn test_weights_normalised() {
        let mix = MixtureGaussian::generate(&shape(), Perturbation::NONE, 1).unwrap();
        let total: f64 = mix.weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_scale_reflected() {
        let perturbation = Perturbation {
            eps_loc: 0.0,
            eps_scale: 5.0,
        };
        let mix = MixtureGaussian::generate(&shape(), perturbation, 2).unwrap();
        assert!(mix.scale().iter().all(|&s| s >= MIN_SCALE));
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = MixtureGaussian::generate(&MixtureConfig { ncomp: 0, ndims: 2 }, Perturbation::NONE, 0);
        assert!(matches!(err, Err(MetricError::InvalidDistribution { .. })));
    }

    #[test]
    fn test_sample_shape_and_mean() {
        let mix = MixtureGaussian::from_parts(
            DMatrix::from_row_slice(1, 2, &[1.0, -2.0]),
            DMatrix::from_row_slice(1, 2, &[0.5, 0.5]),
            vec![1.0],
        )
        .unwrap();
        let mut rng = RandomContext::new(0);
        let x = mix.sample(4_000, &mut rng);
        assert_eq!(x.shape(), (4_000, 2));
        assert!((x.column(0).mean() - 1.0).abs() < 0.05);
        assert!((x.column(1).mean() + 2.0).abs() < 0.05);
    }

    #[test]
    fn test_log_prob_single_gaussian() {
        let mix = MixtureGaussian::from_parts(
            DMatrix::from_row_slice(1, 1, &[0.0]),
            DMatrix::from_row_slice(1, 1, &[2.0]),
            vec![3.0],
        )
        .unwrap();
        // N(1 | 0, 2): -0.5 * 0.25 - ln 2 - 0.5 ln(2 pi)
        let expected = -0.125 - 2f64.ln() - 0.5 * (2.0 * PI).ln();
        assert!((mix.log_prob(&[1.0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_log_prob_equal_components() {
        // Two identical components must give the single-component density
        let single = MixtureGaussian::from_parts(
            DMatrix::from_row_slice(1, 1, &[0.0]),
            DMatrix::from_row_slice(1, 1, &[1.0]),
            vec![1.0],
        )
        .unwrap();
        let double = MixtureGaussian::from_parts(
            DMatrix::from_row_slice(2, 1, &[0.0, 0.0]),
            DMatrix::from_row_slice(2, 1, &[1.0, 1.0]),
            vec![0.3, 0.7],
        )
        .unwrap();
        assert!((single.log_prob(&[0.7]) - double.log_prob(&[0.7])).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_parts_rejected() {
        let err = MixtureGaussian::from_parts(
            DMatrix::zeros(2, 3),
            DMatrix::from_element(2, 3, 1.0),
            vec![1.0],
        );
        assert!(err.is_err());
    }
}
