//! Per-tier bisection state machine.

use serde::{Deserialize, Serialize};

use crate::convergence::{relative_error_metric, Tolerances};
use crate::interval::SearchInterval;
use crate::step::{StepController, StepPolicy};

/// Static parameters of a search, shared by every tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Initial interval; its upper bound is restored at every tier change.
    pub eps_bounds: SearchInterval,
    /// Convergence tolerances.
    pub tolerances: Tolerances,
    /// Probe budget per tier.
    pub max_iterations: usize,
    /// Probe placement policy.
    pub step_policy: StepPolicy,
}

/// What one probe did to the tier state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Epsilon that was probed.
    pub eps: f64,
    /// Next probe point.
    pub next_eps: f64,
    /// Statistic observed at `eps`.
    pub metric: f64,
    /// Threshold it was compared against.
    pub threshold: f64,
    /// `metric > threshold`.
    pub overshoot: bool,
    /// Interval after the update.
    pub interval: SearchInterval,
    /// Relative interval width after the update.
    pub relative_error_eps: f64,
    /// Relative gap between metric and threshold.
    pub relative_error_metric: f64,
    /// Division factor after the controller update.
    pub division_factor: f64,
    /// The controller reduced its division factor on this probe.
    pub factor_reduced: bool,
    /// Both tolerances hold.
    pub converged: bool,
}

/// Bisection state for the tier currently being searched.
///
/// The caller asks for [`probe_point`](Self::probe_point), evaluates the
/// statistic there and feeds it back through [`observe`](Self::observe).
/// When a tier ends the caller restarts the state with
/// [`restart_from`](Self::restart_from).
#[derive(Debug, Clone)]
pub struct TierSearch {
    settings: SearchSettings,
    interval: SearchInterval,
    controller: StepController,
    eps: f64,
    iteration: usize,
}

impl TierSearch {
    /// Start the first tier on the configured bounds.
    pub fn new(settings: SearchSettings) -> Self {
        let interval = settings.eps_bounds;
        Self {
            settings,
            interval,
            controller: StepController::new(settings.step_policy, interval.relative_width()),
            eps: interval.midpoint(),
            iteration: 0,
        }
    }

    /// Epsilon to evaluate next.
    pub fn probe_point(&self) -> f64 {
        self.eps
    }

    /// Current bracketing interval.
    pub fn interval(&self) -> SearchInterval {
        self.interval
    }

    /// Current division factor.
    pub fn division_factor(&self) -> f64 {
        self.controller.division_factor()
    }

    /// Probes spent on the current tier.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Search settings.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// The probe budget for this tier is spent.
    pub fn is_exhausted(&self) -> bool {
        self.iteration >= self.settings.max_iterations
    }

    /// Feed the statistic observed at [`probe_point`](Self::probe_point).
    pub fn observe(&mut self, metric: f64, threshold: f64) -> Observation {
        self.iteration += 1;
        let eps = self.eps;

        let overshoot = metric > threshold;
        if overshoot {
            self.interval.lower_ceiling(eps);
        } else {
            self.interval.raise_floor(eps);
        }
        self.eps = self.controller.next_probe(&self.interval, overshoot);

        let relative_error_eps = self.interval.relative_width();
        let relative_error_metric = relative_error_metric(threshold, metric);
        let factor_reduced = self
            .controller
            .observe(relative_error_eps, relative_error_metric);
        let converged = self
            .settings
            .tolerances
            .is_satisfied(relative_error_eps, relative_error_metric);

        Observation {
            eps,
            next_eps: self.eps,
            metric,
            threshold,
            overshoot,
            interval: self.interval,
            relative_error_eps,
            relative_error_metric,
            division_factor: self.controller.division_factor(),
            factor_reduced,
            converged,
        }
    }

    /// Begin a new tier on `[floor, eps_max0]`.
    ///
    /// Resets the probe point to the midpoint, the step controller and the
    /// iteration counter.
    pub fn restart_from(&mut self, floor: f64) {
        self.interval = SearchInterval::new(floor, self.settings.eps_bounds.eps_max);
        self.eps = self.interval.midpoint();
        self.controller.reset();
        self.iteration = 0;
    }
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn policy_strategy() -> impl Strategy<Value = StepPolicy> {
        prop_oneof![
            Just(StepPolicy::Fixed),
            (0.5f64..0.99, 1.0f64..3.0).prop_map(|(i, r)| StepPolicy::adaptive(i, r)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The interval never grows and always contains the next probe
        #[test]
        fn prop_interval_never_expands(
            policy in policy_strategy(),
            metrics in prop::collection::vec(0.0f64..2.0, 1..60),
        ) {
            let mut search = TierSearch::new(SearchSettings {
                eps_bounds: SearchInterval::new(0.0, 1.0),
                tolerances: Tolerances::new(0.0, 0.0),
                max_iterations: 100,
                step_policy: policy,
            });
            let mut previous = search.interval();
            for metric in metrics {
                let obs = search.observe(metric, 1.0);
                prop_assert!(obs.interval.eps_min >= previous.eps_min);
                prop_assert!(obs.interval.eps_max <= previous.eps_max);
                prop_assert!(obs.interval.contains(obs.next_eps));
                previous = obs.interval;
            }
        }

        /// The division factor never increases and stays in [0.5, initial]
        #[test]
        fn prop_division_factor_monotone(
            initial in 0.5f64..0.99,
            reduce in 1.0f64..3.0,
            metrics in prop::collection::vec(0.0f64..2.0, 1..60),
        ) {
            let mut search = TierSearch::new(SearchSettings {
                eps_bounds: SearchInterval::new(0.0, 1.0),
                tolerances: Tolerances::new(0.0, 0.0),
                max_iterations: 100,
                step_policy: StepPolicy::adaptive(initial, reduce),
            });
            let mut previous = search.division_factor();
            for metric in metrics {
                let obs = search.observe(metric, 1.0);
                prop_assert!(obs.division_factor <= previous);
                prop_assert!(obs.division_factor >= 0.5);
                prop_assert!(obs.division_factor <= initial);
                previous = obs.division_factor;
            }
        }
    }
}
