//! Run records written to the exclusion store.

use serde::{Deserialize, Serialize};

use exclusion_core::StepPolicy;

use crate::config::{MetricConfig, MixtureConfig, SearchConfig, TestConfig, ThresholdPolicy};
use crate::types::DeformationMode;

/// One resolved tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    /// Confidence level of the tier.
    pub confidence_level: f64,
    /// Name of the statistic.
    pub metric_name: String,
    /// Estimated crossing epsilon.
    #[serde(with = "crate::output::lossy::float")]
    pub eps_at_crossing: f64,
    /// Statistic at the last probe of the tier.
    #[serde(with = "crate::output::lossy::float")]
    pub metric_value_at_crossing: f64,
    /// Wall time spent on the tier.
    pub elapsed_seconds: f64,
}

/// Search parameters recorded with every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub ncomp: usize,
    pub ndims: usize,
    pub seed_dist: u64,
    #[serde(with = "crate::output::lossy::float")]
    pub x_tol: f64,
    #[serde(with = "crate::output::lossy::float")]
    pub fn_tol: f64,
    #[serde(with = "crate::output::lossy::float")]
    pub eps_min: f64,
    #[serde(with = "crate::output::lossy::float")]
    pub eps_max: f64,
    pub max_iterations: usize,
    pub save: bool,
    pub step_policy: StepPolicy,
    pub likelihood_ratio: bool,
    #[serde(with = "crate::output::lossy::float_vec")]
    pub confidence_levels: Vec<f64>,
}

impl RunParameters {
    pub(crate) fn new(search: &SearchConfig, thresholds: &ThresholdPolicy, mixture: &MixtureConfig) -> Self {
        Self {
            ncomp: mixture.ncomp,
            ndims: mixture.ndims,
            seed_dist: search.seed_dist,
            x_tol: search.tolerances.x_tol,
            fn_tol: search.tolerances.fn_tol,
            eps_min: search.eps_bounds.eps_min,
            eps_max: search.eps_bounds.eps_max,
            max_iterations: search.max_iterations,
            save: search.save,
            step_policy: search.step_policy,
            likelihood_ratio: thresholds.is_likelihood_ratio(),
            confidence_levels: thresholds.confidence_levels(),
        }
    }
}

/// Everything one solver run produced.
///
/// Tiers that exhausted their probe budget have no record; compare
/// `exclusion_records.len()` with the number of tiers, or inspect
/// `exhausted_tiers`, to detect this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// ISO-8601 start time, the key of the run in the store.
    pub timestamp: String,
    pub test_config: TestConfig,
    /// Metric configuration, including any threshold history appended
    /// during the run.
    pub metric_config: MetricConfig,
    pub deformation: DeformationMode,
    pub parameters: RunParameters,
    /// Resolved tiers, in tier order.
    pub exclusion_records: Vec<ExclusionRecord>,
    /// Probed epsilons, in probe order.
    #[serde(with = "crate::output::lossy::float_vec")]
    pub eps_trace: Vec<f64>,
    /// Statistic at every probe.
    #[serde(with = "crate::output::lossy::float_vec")]
    pub metric_trace: Vec<f64>,
    /// Indices of tiers that ran out of probes.
    #[serde(default)]
    pub exhausted_tiers: Vec<usize>,
    pub total_elapsed_seconds: f64,
}

impl RunResult {
    /// Number of probes evaluated.
    pub fn probes(&self) -> usize {
        self.eps_trace.len()
    }

    /// Record of the tier at `confidence_level`, if it converged.
    pub fn record_at(&self, confidence_level: f64) -> Option<&ExclusionRecord> {
        self.exclusion_records
            .iter()
            .find(|r| r.confidence_level == confidence_level)
    }
}
