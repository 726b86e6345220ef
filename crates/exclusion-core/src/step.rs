//! Probe placement: fixed midpoint bisection or adaptive division factor.
//!
//! After a probe the next point is placed at `factor` of the interval width,
//! measured from the bound the probe just replaced:
//!
//! ```text
//! overshoot:  eps = eps_max - (eps_max - eps_min) * factor
//! otherwise:  eps = eps_min + (eps_max - eps_min) * factor
//! ```
//!
//! With `factor = 0.5` both forms give the midpoint. The adaptive policy
//! starts above the midpoint and divides the factor by `reduce` every time
//! both relative errors halve, until the factor would reach 0.5; from then
//! on it stays pinned at 0.5 for the rest of the tier.

use serde::{Deserialize, Serialize};

use crate::constants::MIDPOINT_DIVISION_FACTOR;
use crate::convergence::ConvergenceTracker;
use crate::interval::SearchInterval;

/// How the next probe point is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum StepPolicy {
    /// Plain bisection: always probe the midpoint.
    #[default]
    Fixed,
    /// Adaptive bisection with a shrinking division factor.
    Adaptive {
        /// Division factor at the start of every tier, in `[0.5, 1)`.
        initial_division_factor: f64,
        /// Divisor applied on each reduction, `>= 1`.
        reduce_division_factor: f64,
    },
}

impl StepPolicy {
    /// Adaptive policy with the given initial factor and divisor.
    pub fn adaptive(initial_division_factor: f64, reduce_division_factor: f64) -> Self {
        StepPolicy::Adaptive {
            initial_division_factor,
            reduce_division_factor,
        }
    }

    /// Division factor used for the first step of every tier.
    pub fn initial_division_factor(&self) -> f64 {
        match self {
            StepPolicy::Fixed => MIDPOINT_DIVISION_FACTOR,
            StepPolicy::Adaptive {
                initial_division_factor,
                ..
            } => *initial_division_factor,
        }
    }

    /// Short name for logs and result records.
    pub fn name(&self) -> &'static str {
        match self {
            StepPolicy::Fixed => "bisection",
            StepPolicy::Adaptive { .. } => "adaptive-bisection",
        }
    }

    /// Whether this policy adapts its division factor.
    pub fn is_adaptive(&self) -> bool {
        matches!(self, StepPolicy::Adaptive { .. })
    }
}

/// Per-tier probe placement state.
#[derive(Debug, Clone)]
pub struct StepController {
    policy: StepPolicy,
    division_factor: f64,
    tracker: ConvergenceTracker,
}

impl StepController {
    /// Create a controller. `initial_relative_error` seeds the convergence
    /// tracker and is normally the relative width of the starting interval.
    pub fn new(policy: StepPolicy, initial_relative_error: f64) -> Self {
        Self {
            policy,
            division_factor: policy.initial_division_factor(),
            tracker: ConvergenceTracker::new(initial_relative_error),
        }
    }

    /// Current division factor.
    pub fn division_factor(&self) -> f64 {
        self.division_factor
    }

    /// Step policy in use.
    pub fn policy(&self) -> StepPolicy {
        self.policy
    }

    /// Stored convergence references.
    pub fn tracker(&self) -> &ConvergenceTracker {
        &self.tracker
    }

    /// Next probe point inside an interval that was just updated.
    pub fn next_probe(&self, interval: &SearchInterval, overshoot: bool) -> f64 {
        let factor = match self.policy {
            StepPolicy::Fixed => MIDPOINT_DIVISION_FACTOR,
            StepPolicy::Adaptive { .. } => self.division_factor,
        };
        if overshoot {
            interval.from_ceiling(factor)
        } else {
            interval.from_floor(factor)
        }
    }

    /// Feed the relative errors of the latest probe.
    ///
    /// Returns `true` when the division factor was reduced.
    pub fn observe(&mut self, relative_error_eps: f64, relative_error_metric: f64) -> bool {
        let StepPolicy::Adaptive {
            reduce_division_factor,
            ..
        } = self.policy
        else {
            return false;
        };

        if self.division_factor / reduce_division_factor <= MIDPOINT_DIVISION_FACTOR {
            self.division_factor = MIDPOINT_DIVISION_FACTOR;
            return false;
        }

        if self.tracker.is_halved(relative_error_eps, relative_error_metric) {
            self.tracker.record(relative_error_eps, relative_error_metric);
            self.division_factor /= reduce_division_factor;
            return true;
        }

        false
    }

    /// Restore the tier-start state.
    pub fn reset(&mut self) {
        self.division_factor = self.policy.initial_division_factor();
        self.tracker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policy_is_midpoint() {
        let controller = StepController::new(StepPolicy::Fixed, 2.0);
        let interval = SearchInterval::new(0.0, 0.4);
        assert_eq!(controller.next_probe(&interval, true), 0.2);
        assert_eq!(controller.next_probe(&interval, false), 0.2);
    }

    #[test]
    fn test_fixed_policy_ignores_observations() {
        let mut controller = StepController::new(StepPolicy::Fixed, 2.0);
        assert!(!controller.observe(0.0, 0.0));
        assert_eq!(controller.division_factor(), 0.5);
    }

    #[test]
    fn test_adaptive_probe_bias() {
        let controller = StepController::new(StepPolicy::adaptive(0.75, 1.5), 2.0);
        let interval = SearchInterval::new(0.0, 1.0);
        // Overshoot moves the probe toward eps_min, undershoot toward eps_max
        assert_eq!(controller.next_probe(&interval, true), 0.25);
        assert_eq!(controller.next_probe(&interval, false), 0.75);
    }

    #[test]
    fn test_adaptive_reduction_requires_both_errors_halved() {
        let mut controller = StepController::new(StepPolicy::adaptive(0.9, 1.2), 2.0);

        assert!(!controller.observe(0.5, 1.5));
        assert_eq!(controller.division_factor(), 0.9);

        assert!(controller.observe(0.5, 0.5));
        assert!((controller.division_factor() - 0.75).abs() < 1e-12);
        assert_eq!(controller.tracker().relative_error_eps_threshold, 0.5);
    }

    #[test]
    fn test_adaptive_pins_at_midpoint() {
        let mut controller = StepController::new(StepPolicy::adaptive(0.8, 2.0), 2.0);
        // 0.8 / 2 <= 0.5: pinned on the first observation, even without progress
        assert!(!controller.observe(10.0, 10.0));
        assert_eq!(controller.division_factor(), 0.5);
        assert!(!controller.observe(0.0, 0.0));
        assert_eq!(controller.division_factor(), 0.5);
    }

    #[test]
    fn test_adaptive_without_reduction_keeps_factor() {
        // reduce = 1 never shrinks and never pins above the midpoint
        let mut controller = StepController::new(StepPolicy::adaptive(0.7, 1.0), 2.0);
        for _ in 0..10 {
            controller.observe(0.0, 0.0);
        }
        assert_eq!(controller.division_factor(), 0.7);
    }

    #[test]
    fn test_reset_restores_initial_factor() {
        let mut controller = StepController::new(StepPolicy::adaptive(0.9, 1.2), 2.0);
        controller.observe(0.1, 0.1);
        assert!(controller.division_factor() < 0.9);
        controller.reset();
        assert_eq!(controller.division_factor(), 0.9);
        assert_eq!(controller.tracker().relative_error_metric_threshold, 2.0);
    }
}
