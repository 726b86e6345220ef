//! Configuration for exclusion-limit searches.
//!
//! Three structs cover the three concerns of a run:
//!
//! - [`SearchConfig`]: the bisection itself (bounds, tolerances, budget,
//!   step policy, where results go).
//! - [`TestConfig`]: how each metric evaluation samples (batch size, number
//!   of batches, sampling seed).
//! - [`MetricConfig`]: which statistic, how it is scaled and which thresholds
//!   it is compared against. It also carries the threshold history written by
//!   likelihood-ratio searches.
//!
//! [`ThresholdPolicy`] selects between a fixed threshold list and thresholds
//! recomputed from a null sample at every probe.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use exclusion_core::constants::{
    DEFAULT_CONFIDENCE_LEVELS, DEFAULT_EPS_MAX, DEFAULT_EPS_MIN, DEFAULT_FN_TOL,
    DEFAULT_MAX_ITERATIONS, DEFAULT_X_TOL,
};
use exclusion_core::{SearchInterval, SearchSettings, StepPolicy, ThresholdTier, Tolerances};

use crate::error::ConfigError;
use crate::metric::{MetricKind, MetricScale};
use crate::types::DeformationMode;

/// Number of trailing entries of [`MetricConfig::thresholds`] searched by the
/// fixed-threshold solvers.
pub const STATIC_TIER_COUNT: usize = 2;

/// Batches evaluated for the alternative hypothesis in likelihood-ratio mode.
pub const DEFAULT_ALT_NITER: usize = 10;

/// File name of the run store inside the output directory.
pub const EXCLUSION_STORE_FILE: &str = "exclusion_limits.json";

/// File name of the metric configuration store inside the output directory.
pub const METRICS_CONFIG_FILE: &str = "metrics_config.json";

// =============================================================================
// SearchConfig
// =============================================================================

/// Bisection parameters shared by every tier of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Seed of the reference and perturbed mixtures.
    ///
    /// Both are built from the same seed so that they share their base
    /// parameters and differ only by the perturbation. Default: 0.
    pub seed_dist: u64,

    /// Relative tolerances on the interval width and the metric gap.
    ///
    /// Default: 0.01 / 0.01.
    pub tolerances: Tolerances,

    /// Initial search interval. Its upper bound is restored at every tier
    /// change. Default: [0, 1].
    pub eps_bounds: SearchInterval,

    /// Probe budget per tier. Default: 100.
    pub max_iterations: usize,

    /// Probe placement. Default: plain bisection.
    pub step_policy: StepPolicy,

    /// Merge the run into the exclusion store under `output_dir`.
    /// Likelihood-ratio side files are written either way. Default: true.
    pub save: bool,

    /// Directory holding the result stores. Default: current directory.
    pub output_dir: PathBuf,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seed_dist: 0,
            tolerances: Tolerances::new(DEFAULT_X_TOL, DEFAULT_FN_TOL),
            eps_bounds: SearchInterval::new(DEFAULT_EPS_MIN, DEFAULT_EPS_MAX),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            step_policy: StepPolicy::Fixed,
            save: true,
            output_dir: PathBuf::from("."),
        }
    }
}

impl SearchConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loose tolerances and a small budget for exploratory runs:
    /// - 5% relative tolerances
    /// - 30 probes per tier
    pub fn quick() -> Self {
        Self {
            tolerances: Tolerances::new(0.05, 0.05),
            max_iterations: 30,
            ..Default::default()
        }
    }

    /// Tight tolerances and a large budget for final numbers:
    /// - 0.1% relative tolerances
    /// - 300 probes per tier
    pub fn thorough() -> Self {
        Self {
            tolerances: Tolerances::new(0.001, 0.001),
            max_iterations: 300,
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Set the mixture seed.
    pub fn seed_dist(mut self, seed: u64) -> Self {
        self.seed_dist = seed;
        self
    }

    /// Set both tolerances.
    pub fn tolerances(mut self, x_tol: f64, fn_tol: f64) -> Self {
        self.tolerances = Tolerances::new(x_tol, fn_tol);
        self
    }

    /// Set the initial search interval.
    pub fn eps_bounds(mut self, eps_min: f64, eps_max: f64) -> Self {
        self.eps_bounds = SearchInterval { eps_min, eps_max };
        self
    }

    /// Set the probe budget per tier.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the step policy.
    pub fn step_policy(mut self, policy: StepPolicy) -> Self {
        self.step_policy = policy;
        self
    }

    /// Enable or disable persistence.
    pub fn save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Path of the run store.
    pub fn store_path(&self) -> PathBuf {
        self.output_dir.join(EXCLUSION_STORE_FILE)
    }

    /// Path of the metric configuration store.
    pub fn metrics_config_path(&self) -> PathBuf {
        self.output_dir.join(METRICS_CONFIG_FILE)
    }

    /// Null file template for `metric`: its own template if set, otherwise
    /// `null_<name>.json` under `output_dir`.
    pub fn null_file_template(&self, metric: &MetricConfig) -> PathBuf {
        metric
            .null_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join(format!("null_{}.json", metric.name)))
    }

    /// Settings handed to the tier search.
    pub fn settings(&self) -> SearchSettings {
        SearchSettings {
            eps_bounds: self.eps_bounds,
            tolerances: self.tolerances,
            max_iterations: self.max_iterations,
            step_policy: self.step_policy,
        }
    }

    /// Check bounds, tolerances and step policy.
    ///
    /// A zero lower bound is accepted: the relative width is still finite as
    /// long as `eps_max > 0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Tolerances { x_tol, fn_tol } = self.tolerances;
        if !(x_tol > 0.0 && fn_tol > 0.0) {
            return Err(ConfigError::InvalidTolerances { x_tol, fn_tol });
        }

        let SearchInterval { eps_min, eps_max } = self.eps_bounds;
        if !(eps_min.is_finite() && eps_max.is_finite() && eps_min < eps_max) {
            return Err(ConfigError::InvalidBounds { eps_min, eps_max });
        }

        if let StepPolicy::Adaptive {
            initial_division_factor,
            reduce_division_factor,
        } = self.step_policy
        {
            if !(0.5..1.0).contains(&initial_division_factor) {
                return Err(ConfigError::InvalidDivisionFactor(initial_division_factor));
            }
            if !(reduce_division_factor >= 1.0) {
                return Err(ConfigError::InvalidReduceFactor(reduce_division_factor));
            }
        }

        Ok(())
    }
}

// =============================================================================
// TestConfig
// =============================================================================

/// Sampling parameters of one metric evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Points drawn from each distribution per batch. Default: 10,000.
    pub batch_size_test: usize,

    /// Independent batches per evaluation. Default: 100.
    pub niter: usize,

    /// Sampling seed. Every evaluation restarts from it, so all probes of a
    /// run see the same random streams. Default: 0.
    pub seed: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            batch_size_test: 10_000,
            niter: 100,
            seed: 0,
        }
    }
}

impl TestConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Small batches for development: 1,000 points, 20 batches.
    pub fn quick() -> Self {
        Self {
            batch_size_test: 1_000,
            niter: 20,
            ..Default::default()
        }
    }

    /// Set the batch size.
    pub fn batch_size_test(mut self, size: usize) -> Self {
        self.batch_size_test = size;
        self
    }

    /// Set the number of batches.
    pub fn niter(mut self, niter: usize) -> Self {
        self.niter = niter;
        self
    }

    /// Set the sampling seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Effective sample size `batch² / (2 · batch)` fed to the metric scale.
    pub fn effective_sample_size(&self) -> f64 {
        let n = self.batch_size_test as f64;
        n * n / (2.0 * n)
    }

    /// Check batch size and batch count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size_test == 0 {
            return Err(ConfigError::ZeroSize {
                field: "batch_size_test",
            });
        }
        if self.niter == 0 {
            return Err(ConfigError::ZeroSize { field: "niter" });
        }
        Ok(())
    }
}

// =============================================================================
// MetricConfig
// =============================================================================

/// Shape of the mixtures being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixtureConfig {
    /// Number of mixture components.
    pub ncomp: usize,
    /// Number of dimensions.
    pub ndims: usize,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self { ncomp: 3, ndims: 4 }
    }
}

/// Thresholds computed from a null sample at one probe point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdHistoryEntry {
    /// Probe epsilon.
    #[serde(with = "crate::output::lossy::float")]
    pub eps: f64,
    /// Deformation applied at that probe.
    pub deformation: DeformationMode,
    /// One tier per configured confidence level.
    pub thresholds: Vec<ThresholdTier>,
}

/// Statistic selection, scaling and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Display name, also the key in the metric configuration store.
    pub name: String,

    /// Which statistic to compute.
    pub kind: MetricKind,

    /// Statistic-specific options (e.g. `nslices` for sliced Wasserstein).
    #[serde(default)]
    pub kwargs: serde_json::Map<String, serde_json::Value>,

    /// Result column averaged into the probe statistic.
    pub result_key: String,

    /// Scale applied to the column mean.
    pub scale: MetricScale,

    /// Upper bound on batches held in memory at once.
    pub max_vectorize: usize,

    /// Mixture shape.
    pub mixture: MixtureConfig,

    /// Precomputed thresholds. Fixed-threshold searches use the last
    /// [`STATIC_TIER_COUNT`] entries.
    #[serde(default)]
    pub thresholds: Vec<ThresholdTier>,

    /// Thresholds recomputed by likelihood-ratio searches, one entry per probe.
    #[serde(default)]
    pub threshold_history: Vec<ThresholdHistoryEntry>,

    /// Template for per-probe null result files (`base.json` becomes
    /// `base_<mode>_<eps>.json`). Likelihood-ratio searches fall back to
    /// `<output_dir>/null_<name>.json` when unset.
    #[serde(default)]
    pub null_file: Option<PathBuf>,
}

impl MetricConfig {
    /// Configuration for `kind` with its default result column and scale.
    pub fn new(kind: MetricKind, mixture: MixtureConfig) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            kwargs: serde_json::Map::new(),
            result_key: kind.name().to_string(),
            scale: kind.default_scale(),
            max_vectorize: 100,
            mixture,
            thresholds: Vec::new(),
            threshold_history: Vec::new(),
            null_file: None,
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set one statistic option.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Set the result column.
    pub fn result_key(mut self, key: impl Into<String>) -> Self {
        self.result_key = key.into();
        self
    }

    /// Set the scale.
    pub fn scale(mut self, scale: MetricScale) -> Self {
        self.scale = scale;
        self
    }

    /// Set the batch chunk size.
    pub fn max_vectorize(mut self, max: usize) -> Self {
        self.max_vectorize = max;
        self
    }

    /// Set the precomputed thresholds.
    pub fn thresholds(mut self, thresholds: Vec<ThresholdTier>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the null file template.
    pub fn null_file(mut self, path: impl AsRef<Path>) -> Self {
        self.null_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Check sizes and the scale exponent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mixture.ncomp == 0 {
            return Err(ConfigError::ZeroSize { field: "ncomp" });
        }
        if self.mixture.ndims == 0 {
            return Err(ConfigError::ZeroSize { field: "ndims" });
        }
        if self.max_vectorize == 0 {
            return Err(ConfigError::ZeroSize {
                field: "max_vectorize",
            });
        }
        if let MetricScale::Power { exponent, .. } = self.scale {
            if !exponent.is_finite() {
                return Err(ConfigError::InvalidScaleExponent(exponent));
            }
        }
        Ok(())
    }
}

// =============================================================================
// ThresholdPolicy
// =============================================================================

/// Where the thresholds of each tier come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Fixed tiers, searched in list order.
    Static(Vec<ThresholdTier>),
    /// Tiers recomputed at every probe from a null-hypothesis evaluation.
    LikelihoodRatio {
        /// One tier per level, searched in list order.
        confidence_levels: Vec<f64>,
        /// Batches used for the alternative evaluation.
        alt_niter: usize,
    },
}

impl ThresholdPolicy {
    /// The last [`STATIC_TIER_COUNT`] thresholds of `metric_config`.
    pub fn from_metric_config(metric_config: &MetricConfig) -> Self {
        let tiers = &metric_config.thresholds;
        let start = tiers.len().saturating_sub(STATIC_TIER_COUNT);
        ThresholdPolicy::Static(tiers[start..].to_vec())
    }

    /// Likelihood-ratio thresholds at `confidence_levels`.
    pub fn likelihood_ratio(confidence_levels: Vec<f64>) -> Self {
        ThresholdPolicy::LikelihoodRatio {
            confidence_levels,
            alt_niter: DEFAULT_ALT_NITER,
        }
    }

    /// Number of tiers searched.
    pub fn tier_count(&self) -> usize {
        match self {
            ThresholdPolicy::Static(tiers) => tiers.len(),
            ThresholdPolicy::LikelihoodRatio {
                confidence_levels, ..
            } => confidence_levels.len(),
        }
    }

    /// Confidence levels of the tiers, in search order.
    pub fn confidence_levels(&self) -> Vec<f64> {
        match self {
            ThresholdPolicy::Static(tiers) => tiers.iter().map(|t| t.confidence_level).collect(),
            ThresholdPolicy::LikelihoodRatio {
                confidence_levels, ..
            } => confidence_levels.clone(),
        }
    }

    /// Whether thresholds are recomputed per probe.
    pub fn is_likelihood_ratio(&self) -> bool {
        matches!(self, ThresholdPolicy::LikelihoodRatio { .. })
    }

    /// Check that there is at least one tier and every level is in `(0, 1)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tier_count() == 0 {
            return Err(ConfigError::EmptyThresholds);
        }
        for cl in self.confidence_levels() {
            if !(cl > 0.0 && cl < 1.0) {
                return Err(ConfigError::InvalidConfidenceLevel(cl));
            }
        }
        if let ThresholdPolicy::LikelihoodRatio { alt_niter: 0, .. } = self {
            return Err(ConfigError::ZeroSize { field: "alt_niter" });
        }
        Ok(())
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::likelihood_ratio(DEFAULT_CONFIDENCE_LEVELS.to_vec())
    }
}
