//! Two-sample statistics and their evaluation.
//!
//! A [`MetricEvaluator`] turns a pair of distributions into a [`ResultSet`]
//! of per-batch statistic values. The default evaluator,
//! [`RegistryEvaluator`], looks the statistic up in a [`MetricRegistry`] by
//! its [`MetricKind`] and runs `niter` independent batches of
//! `batch_size_test` points each, in parallel when the `parallel` feature is
//! enabled.
//!
//! Built-in statistics:
//!
//! | Kind | Name | Per-batch value |
//! |------|------|-----------------|
//! | [`MetricKind::KsMean`] | `ks_mean` | Kolmogorov-Smirnov statistic, averaged over dimensions |
//! | [`MetricKind::SlicedWasserstein`] | `sw_mean` | 1-Wasserstein distance, averaged over random 1-D projections |
//! | [`MetricKind::LikelihoodRatio`] | `lr_statistic` | `2 Σ [log p_pert(y) - log p_ref(y)]` |

mod ks;
mod likelihood_ratio;
mod registry;
mod result_set;
mod sliced_wasserstein;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{MetricConfig, TestConfig};
use crate::distribution::Distribution;
use crate::error::{ConfigError, MetricError};
use crate::random::RandomContext;
use crate::types::Perturbation;

pub use ks::{ks_statistic, KsMean};
pub use likelihood_ratio::LikelihoodRatio;
pub use registry::{MetricConstructor, MetricRegistry, RegistryEvaluator};
pub use result_set::{Column, ResultSet};
pub use sliced_wasserstein::{wasserstein_1d, SlicedWasserstein};

/// Identifier of a built-in statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Mean over dimensions of the per-dimension KS statistic.
    #[serde(rename = "ks_mean")]
    KsMean,
    /// Sliced 1-Wasserstein distance.
    #[serde(rename = "sw_mean")]
    SlicedWasserstein,
    /// Log-likelihood-ratio statistic.
    #[serde(rename = "lr_statistic")]
    LikelihoodRatio,
}

impl MetricKind {
    /// Registry name, also the default result column.
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::KsMean => "ks_mean",
            MetricKind::SlicedWasserstein => "sw_mean",
            MetricKind::LikelihoodRatio => "lr_statistic",
        }
    }

    /// Scale applied when none is configured.
    pub fn default_scale(self) -> MetricScale {
        match self {
            MetricKind::KsMean | MetricKind::SlicedWasserstein => MetricScale::SqrtSampleSize,
            MetricKind::LikelihoodRatio => MetricScale::Identity,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ks_mean" => Ok(MetricKind::KsMean),
            "sw_mean" => Ok(MetricKind::SlicedWasserstein),
            "lr_statistic" => Ok(MetricKind::LikelihoodRatio),
            other => Err(ConfigError::UnknownMetric(other.to_string())),
        }
    }
}

/// Factor applied to the mean of the result column, as a function of the
/// effective sample size `ns` and the dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricScale {
    /// `1`
    Identity,
    /// `sqrt(ns)`
    SqrtSampleSize,
    /// `ns`
    SampleSize,
    /// `sqrt(ns) / ndims`
    SqrtSampleSizePerDim,
    /// `ns^exponent`, divided by `ndims` when `per_dim` is set.
    Power { exponent: f64, per_dim: bool },
}

impl MetricScale {
    /// Scale factor for effective sample size `ns` in `ndims` dimensions.
    pub fn apply(self, ns: f64, ndims: usize) -> f64 {
        match self {
            MetricScale::Identity => 1.0,
            MetricScale::SqrtSampleSize => ns.sqrt(),
            MetricScale::SampleSize => ns,
            MetricScale::SqrtSampleSizePerDim => ns.sqrt() / ndims as f64,
            MetricScale::Power { exponent, per_dim } => {
                let factor = ns.powf(exponent);
                if per_dim {
                    factor / ndims as f64
                } else {
                    factor
                }
            }
        }
    }
}

/// Which pair of samples an evaluation draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Reference against perturbed.
    Standard,
    /// Null hypothesis: both samples from the reference.
    Null,
    /// Alternative hypothesis of a likelihood-ratio test: reference against
    /// perturbed.
    Alternative,
}

/// The two distributions of an evaluation, seen through its mode.
#[derive(Clone, Copy)]
pub struct SamplePair<'a> {
    /// Reference distribution; the first sample always comes from it.
    pub reference: &'a dyn Distribution,
    /// Perturbed distribution.
    pub perturbed: &'a dyn Distribution,
    /// Evaluation mode.
    pub mode: EvaluationMode,
}

impl<'a> SamplePair<'a> {
    /// Distribution the second sample is drawn from.
    pub fn second(&self) -> &'a dyn Distribution {
        match self.mode {
            EvaluationMode::Null => self.reference,
            EvaluationMode::Standard | EvaluationMode::Alternative => self.perturbed,
        }
    }
}

/// A two-sample statistic computed on one batch.
pub trait TwoSampleMetric: Send + Sync {
    /// Column the per-batch values are stored under.
    fn column(&self) -> &str;

    /// Draw one batch of `batch_size` points per side and compute the
    /// statistic.
    fn batch_statistic(
        &self,
        pair: &SamplePair<'_>,
        batch_size: usize,
        rng: &mut RandomContext,
    ) -> Result<f64, MetricError>;
}

/// Everything an evaluator needs for one probe.
#[derive(Clone, Copy)]
pub struct EvaluationRequest<'a> {
    /// Reference distribution.
    pub reference: &'a dyn Distribution,
    /// Perturbed distribution.
    pub perturbed: &'a dyn Distribution,
    /// Perturbation the perturbed distribution was built with.
    pub perturbation: Perturbation,
    /// Sampling parameters.
    pub test_config: &'a TestConfig,
    /// Statistic selection.
    pub metric_config: &'a MetricConfig,
    /// Evaluation mode.
    pub mode: EvaluationMode,
}

impl<'a> EvaluationRequest<'a> {
    /// The distributions as seen by a [`TwoSampleMetric`].
    pub fn pair(&self) -> SamplePair<'a> {
        SamplePair {
            reference: self.reference,
            perturbed: self.perturbed,
            mode: self.mode,
        }
    }
}

/// Produces the statistic distribution for one probe.
pub trait MetricEvaluator {
    /// Called once before the first probe of a run. Fails if `metric_config`
    /// cannot be evaluated.
    fn prepare(&mut self, metric_config: &MetricConfig) -> Result<(), ConfigError> {
        let _ = metric_config;
        Ok(())
    }

    /// Evaluate the statistic for `request`.
    fn evaluate(&mut self, request: &EvaluationRequest<'_>) -> crate::Result<ResultSet>;
}
