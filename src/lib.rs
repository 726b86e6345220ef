//! # exclusion-limits
//!
//! Find the smallest perturbation of a Gaussian mixture that a two-sample
//! test can tell apart from the reference.
//!
//! A reference mixture and a perturbed copy (component means, scales, or
//! both shifted by up to `eps`) are compared with a two-sample statistic.
//! For every threshold tier the solver bisects on `eps` until the scaled
//! statistic meets the tier's threshold within tolerance, and reports:
//! - The crossing epsilon per confidence level
//! - The full probe trace
//! - Thresholds derived from null-hypothesis runs (likelihood-ratio mode)
//!
//! ## Quick Start
//!
//! ```ignore
//! use exclusion_limits::{
//!     DeformationMode, ExclusionSolver, MetricConfig, MetricKind, MixtureConfig, SearchConfig,
//!     TestConfig, ThresholdTier,
//! };
//!
//! let mut metric = MetricConfig::new(MetricKind::KsMean, MixtureConfig::default()).thresholds(vec![
//!     ThresholdTier::new(0.95, 0.05),
//!     ThresholdTier::new(0.99, 0.08),
//! ]);
//! let mut solver = ExclusionSolver::adaptive_bisection(&metric, SearchConfig::quick(), 0.8, 1.2);
//! let run = solver.run(&mut metric, &TestConfig::quick(), DeformationMode::Std)?;
//! println!("{}", exclusion_limits::output::to_json_pretty(&run)?);
//! ```
//!
//! ## Likelihood-ratio thresholds
//!
//! `ExclusionSolver::lr_bisection` recomputes the thresholds at every probe
//! from a null-hypothesis evaluation of the likelihood-ratio statistic and
//! keeps the resulting tables in `MetricConfig::threshold_history`.
//!
//! ## Custom statistics
//!
//! Implement [`MetricEvaluator`] (or register a [`TwoSampleMetric`] in a
//! [`MetricRegistry`]) and hand it to [`ExclusionSolver::with_evaluator`].

#![warn(clippy::all)]

// Core modules
mod error;
mod solver;
mod types;

// Functional modules
pub mod config;
pub mod distribution;
pub mod metric;
pub mod output;
pub mod random;

// Re-exports for public API
pub use config::{
    MetricConfig, MixtureConfig, SearchConfig, TestConfig, ThresholdHistoryEntry, ThresholdPolicy,
};
pub use error::{ConfigError, Error, MetricError, PersistError, Result};
pub use metric::{
    EvaluationMode, EvaluationRequest, MetricEvaluator, MetricKind, MetricRegistry, MetricScale,
    RegistryEvaluator, ResultSet, TwoSampleMetric,
};
pub use solver::{ExclusionRecord, ExclusionSolver, RunParameters, RunResult};
pub use types::{DeformationMode, Perturbation};

// Search primitives
pub use exclusion_core::{SearchInterval, StepPolicy, ThresholdTier, Tolerances};
