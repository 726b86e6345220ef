//! Multi-tier search driver.
//!
//! Runs one [`TierSearch`] per threshold tier, in tier order:
//!
//! 1. Probe the current point and compare against the tier's threshold.
//! 2. Narrow the interval and place the next probe.
//! 3. On convergence record a [`Crossing`] and restart on
//!    `[crossing, eps_max0]` for the next tier.
//! 4. On budget exhaustion skip the tier without a record and restart on
//!    `[eps_min, eps_max0]`.
//!
//! Evaluation is delegated to a [`Probe`], which lets the caller recompute
//! thresholds on every probe (likelihood-ratio searches) or serve them from a
//! fixed table.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use crate::threshold::ThresholdTier;
use crate::tier::{Observation, SearchSettings, TierSearch};

/// Statistic and threshold observed at one probe point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probed {
    /// Scaled statistic at the probed epsilon.
    pub metric: f64,
    /// Threshold of the tier being searched.
    pub threshold: ThresholdTier,
}

/// Evaluates the statistic at a probe point.
pub trait Probe {
    /// Error aborting the search.
    type Error;

    /// Evaluate at `eps` while searching tier `tier`.
    fn probe(&mut self, eps: f64, tier: usize) -> Result<Probed, Self::Error>;
}

/// Probe over a deterministic metric function and a fixed threshold table.
pub struct FnProbe<'a, F> {
    thresholds: &'a [ThresholdTier],
    metric_fn: F,
    calls: usize,
}

impl<'a, F> FnProbe<'a, F>
where
    F: FnMut(f64) -> f64,
{
    /// Wrap `metric_fn` with a fixed threshold table.
    pub fn new(thresholds: &'a [ThresholdTier], metric_fn: F) -> Self {
        Self {
            thresholds,
            metric_fn,
            calls: 0,
        }
    }

    /// Number of metric evaluations so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl<F> Probe for FnProbe<'_, F>
where
    F: FnMut(f64) -> f64,
{
    type Error = Infallible;

    fn probe(&mut self, eps: f64, tier: usize) -> Result<Probed, Infallible> {
        self.calls += 1;
        Ok(Probed {
            metric: (self.metric_fn)(eps),
            threshold: self.thresholds[tier],
        })
    }
}

/// A resolved tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Tier index.
    pub tier: usize,
    /// Confidence level of the tier.
    pub confidence_level: f64,
    /// Estimated crossing epsilon (the next probe point at convergence).
    pub eps: f64,
    /// Statistic at the last probe.
    pub metric: f64,
    /// Wall time spent on this tier.
    pub elapsed: Duration,
}

/// Everything a search produced.
#[derive(Debug, Clone, Default)]
pub struct SearchTrace {
    /// Resolved tiers, in tier order.
    pub crossings: Vec<Crossing>,
    /// Every probed epsilon, in probe order.
    pub eps_trace: Vec<f64>,
    /// Statistic at every probe, aligned with `eps_trace`.
    pub metric_trace: Vec<f64>,
    /// Tiers that ran out of probes.
    pub exhausted_tiers: Vec<usize>,
    /// Total wall time.
    pub elapsed: Duration,
}

impl SearchTrace {
    /// Number of probes evaluated.
    pub fn probes(&self) -> usize {
        self.eps_trace.len()
    }
}

/// Progress notifications emitted by [`run_search`].
#[derive(Debug, Clone, Copy)]
pub enum SearchEvent<'a> {
    /// A probe was evaluated and folded into the tier state.
    Probed {
        /// Tier index.
        tier: usize,
        /// 1-based probe number within the tier.
        iteration: usize,
        /// Threshold compared against.
        threshold: &'a ThresholdTier,
        /// State update.
        observation: &'a Observation,
    },
    /// A tier converged.
    Converged(&'a Crossing),
    /// A tier exhausted its budget.
    Exhausted {
        /// Tier index.
        tier: usize,
        /// Interval at exhaustion.
        eps_min: f64,
        /// Interval at exhaustion.
        eps_max: f64,
    },
}

/// Search `tier_count` tiers in order.
///
/// # Errors
///
/// Propagates the first probe error; the partial trace is discarded.
pub fn run_search<P, F>(
    settings: SearchSettings,
    tier_count: usize,
    probe: &mut P,
    mut on_event: F,
) -> Result<SearchTrace, P::Error>
where
    P: Probe,
    F: FnMut(SearchEvent<'_>),
{
    let start = Instant::now();
    let mut trace = SearchTrace::default();
    let mut search = TierSearch::new(settings);
    let mut tier = 0;
    let mut tier_start = Instant::now();

    while tier < tier_count {
        if search.is_exhausted() {
            let interval = search.interval();
            on_event(SearchEvent::Exhausted {
                tier,
                eps_min: interval.eps_min,
                eps_max: interval.eps_max,
            });
            trace.exhausted_tiers.push(tier);
            tier += 1;
            search.restart_from(interval.eps_min);
            tier_start = Instant::now();
            continue;
        }

        let eps = search.probe_point();
        let probed = probe.probe(eps, tier)?;
        trace.eps_trace.push(eps);
        trace.metric_trace.push(probed.metric);

        let observation = search.observe(probed.metric, probed.threshold.value);
        on_event(SearchEvent::Probed {
            tier,
            iteration: search.iteration(),
            threshold: &probed.threshold,
            observation: &observation,
        });

        if observation.converged {
            let crossing = Crossing {
                tier,
                confidence_level: probed.threshold.confidence_level,
                eps: observation.next_eps,
                metric: probed.metric,
                elapsed: tier_start.elapsed(),
            };
            on_event(SearchEvent::Converged(&crossing));
            trace.crossings.push(crossing);
            tier += 1;
            search.restart_from(observation.next_eps);
            tier_start = Instant::now();
        }
    }

    trace.elapsed = start.elapsed();
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::Tolerances;
    use crate::interval::SearchInterval;
    use crate::step::StepPolicy;

    fn settings(policy: StepPolicy, max_iterations: usize) -> SearchSettings {
        SearchSettings {
            eps_bounds: SearchInterval::new(0.0, 1.0),
            tolerances: Tolerances::new(0.01, 0.01),
            max_iterations,
            step_policy: policy,
        }
    }

    fn tiers(values: &[f64]) -> Vec<ThresholdTier> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| ThresholdTier::new(0.9 + 0.01 * i as f64, v))
            .collect()
    }

    fn run(
        policy: StepPolicy,
        max_iterations: usize,
        thresholds: &[ThresholdTier],
        f: impl FnMut(f64) -> f64,
    ) -> (SearchTrace, usize) {
        let mut probe = FnProbe::new(thresholds, f);
        let trace = run_search(
            settings(policy, max_iterations),
            thresholds.len(),
            &mut probe,
            |_| {},
        )
        .unwrap();
        (trace, probe.calls())
    }

    #[test]
    fn test_three_tiers_ascending() {
        let thresholds = tiers(&[1.0, 2.0, 3.0]);
        let (trace, calls) = run(StepPolicy::Fixed, 100, &thresholds, |eps| 5.0 * eps);

        assert_eq!(trace.crossings.len(), 3);
        assert!(trace.exhausted_tiers.is_empty());
        for (i, crossing) in trace.crossings.iter().enumerate() {
            assert_eq!(crossing.tier, i);
            let truth = (i + 1) as f64 / 5.0;
            assert!(
                (crossing.eps - truth).abs() / truth < 0.02,
                "tier {} crossing {} too far from {}",
                i,
                crossing.eps,
                truth
            );
        }
        assert!(trace.crossings[0].eps < trace.crossings[1].eps);
        assert!(trace.crossings[1].eps < trace.crossings[2].eps);
        assert_eq!(calls, trace.probes());
        assert_eq!(trace.eps_trace.len(), trace.metric_trace.len());
    }

    #[test]
    fn test_zero_budget_never_probes() {
        let thresholds = tiers(&[1.0, 2.0]);
        let (trace, calls) = run(StepPolicy::Fixed, 0, &thresholds, |eps| 5.0 * eps);
        assert_eq!(calls, 0);
        assert!(trace.crossings.is_empty());
        assert_eq!(trace.exhausted_tiers, vec![0, 1]);
    }

    #[test]
    fn test_unreachable_tiers_are_skipped() {
        // 5 * eps never reaches 10 or 20 on [0, 1]
        let thresholds = tiers(&[10.0, 20.0]);
        let mut probe = FnProbe::new(&thresholds, |eps| 5.0 * eps);
        let mut restarts = Vec::new();
        let trace = run_search(settings(StepPolicy::Fixed, 30), 2, &mut probe, |event| {
            if let SearchEvent::Exhausted { eps_min, .. } = event {
                restarts.push(eps_min);
            }
        })
        .unwrap();

        assert!(trace.crossings.is_empty());
        assert_eq!(trace.exhausted_tiers, vec![0, 1]);
        assert_eq!(probe.calls(), 60);
        // The second tier keeps the floor the first one reached
        assert!(restarts[0] > 0.99);
        assert!(trace.eps_trace[30] >= restarts[0]);
    }

    #[test]
    fn test_adaptive_needs_fewer_probes_on_concave_metric() {
        let thresholds = tiers(&[1.0]);
        let metric = |eps: f64| (100.0 * eps).ln_1p();

        let (plain, plain_calls) = run(StepPolicy::Fixed, 100, &thresholds, metric);
        let (adaptive, adaptive_calls) =
            run(StepPolicy::adaptive(0.8, 1.2), 100, &thresholds, metric);

        assert_eq!(plain.crossings.len(), 1);
        assert_eq!(adaptive.crossings.len(), 1);
        assert!(
            adaptive_calls < plain_calls,
            "adaptive {} vs plain {}",
            adaptive_calls,
            plain_calls
        );
    }

    #[test]
    fn test_events_reported() {
        let thresholds = tiers(&[1.0]);
        let mut probe = FnProbe::new(&thresholds, |eps| 5.0 * eps);
        let mut probed = 0;
        let mut converged = 0;
        run_search(settings(StepPolicy::Fixed, 100), 1, &mut probe, |event| match event {
            SearchEvent::Probed { .. } => probed += 1,
            SearchEvent::Converged(_) => converged += 1,
            SearchEvent::Exhausted { .. } => panic!("tier should converge"),
        })
        .unwrap();
        assert_eq!(probed, probe.calls());
        assert_eq!(converged, 1);
    }

    #[test]
    fn test_probe_error_aborts() {
        struct Failing;
        impl Probe for Failing {
            type Error = &'static str;
            fn probe(&mut self, _eps: f64, _tier: usize) -> Result<Probed, &'static str> {
                Err("evaluator down")
            }
        }
        let result = run_search(settings(StepPolicy::Fixed, 10), 1, &mut Failing, |_| {});
        assert_eq!(result.unwrap_err(), "evaluator down");
    }
}
