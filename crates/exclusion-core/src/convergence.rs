//! Convergence criteria for the bisection search.
//!
//! A tier is resolved when two independent relative errors drop below their
//! tolerances on the same probe:
//!
//! ```text
//! re_eps    = 2 (eps_max - eps_min) / (eps_max + eps_min)
//! re_metric = 2 |threshold - metric| / (threshold + metric)
//! ```
//!
//! Neither denominator is guarded. A metric that can go negative near
//! `-threshold` makes `re_metric` meaningless; callers own that risk.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FN_TOL, DEFAULT_X_TOL};

/// Relative gap between an observed statistic and its threshold.
pub fn relative_error_metric(threshold: f64, metric: f64) -> f64 {
    2.0 * (threshold - metric).abs() / (threshold + metric)
}

/// Stop criteria on the interval width (`x_tol`) and the metric gap (`fn_tol`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Relative tolerance on the interval width.
    pub x_tol: f64,
    /// Relative tolerance on the metric-to-threshold gap.
    pub fn_tol: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            x_tol: DEFAULT_X_TOL,
            fn_tol: DEFAULT_FN_TOL,
        }
    }
}

impl Tolerances {
    /// Create tolerances from their two components.
    pub fn new(x_tol: f64, fn_tol: f64) -> Self {
        Self { x_tol, fn_tol }
    }

    /// Both relative errors are strictly inside their tolerances.
    ///
    /// NaN in either input never satisfies the criteria.
    pub fn is_satisfied(&self, relative_error_eps: f64, relative_error_metric: f64) -> bool {
        relative_error_eps < self.x_tol && relative_error_metric < self.fn_tol
    }
}

/// Reference errors the adaptive step controller compares progress against.
///
/// Both thresholds start at the relative width of the initial search
/// interval. They are replaced by the current errors each time both errors
/// fall below half the stored values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceTracker {
    initial: f64,
    /// Stored reference for the interval-width error.
    pub relative_error_eps_threshold: f64,
    /// Stored reference for the metric-gap error.
    pub relative_error_metric_threshold: f64,
}

impl ConvergenceTracker {
    /// Create a tracker seeded with the initial relative width.
    pub fn new(initial_relative_error: f64) -> Self {
        Self {
            initial: initial_relative_error,
            relative_error_eps_threshold: initial_relative_error,
            relative_error_metric_threshold: initial_relative_error,
        }
    }

    /// Whether both errors dropped below half of their stored references.
    pub fn is_halved(&self, relative_error_eps: f64, relative_error_metric: f64) -> bool {
        relative_error_eps < self.relative_error_eps_threshold / 2.0
            && relative_error_metric < self.relative_error_metric_threshold / 2.0
    }

    /// Replace the stored references with the current errors.
    pub fn record(&mut self, relative_error_eps: f64, relative_error_metric: f64) {
        self.relative_error_eps_threshold = relative_error_eps;
        self.relative_error_metric_threshold = relative_error_metric;
    }

    /// Restore the references to the initial relative width.
    pub fn reset(&mut self) {
        self.relative_error_eps_threshold = self.initial;
        self.relative_error_metric_threshold = self.initial;
    }
}
