//! Exclusion-limit solver.
//!
//! For each threshold tier the solver finds the smallest perturbation
//! `eps` at which the scaled two-sample statistic between a reference
//! mixture and its perturbed copy reaches the tier's threshold. Tiers are
//! searched in order, each starting where the previous one crossed.
//!
//! ```ignore
//! use exclusion_limits::{DeformationMode, ExclusionSolver, MetricConfig, SearchConfig, TestConfig};
//!
//! let mut metric = MetricConfig::new(MetricKind::KsMean, MixtureConfig::default())
//!     .thresholds(vec![ThresholdTier::new(0.95, 0.05), ThresholdTier::new(0.99, 0.08)]);
//! let mut solver = ExclusionSolver::bisection(&metric, SearchConfig::quick());
//! let run = solver.run(&mut metric, &TestConfig::quick(), DeformationMode::Mean)?;
//! for record in &run.exclusion_records {
//!     println!("{} CL: eps = {}", record.confidence_level, record.eps_at_crossing);
//! }
//! ```

mod probe;
mod record;

pub use record::{ExclusionRecord, RunParameters, RunResult};

use std::fs;

use exclusion_core::{run_search, SearchEvent, StepPolicy};

use crate::config::{MetricConfig, SearchConfig, TestConfig, ThresholdPolicy};
use crate::distribution::{DistributionFactory, MixtureFactory};
use crate::error::{PersistError, Result};
use crate::metric::{MetricEvaluator, RegistryEvaluator};
use crate::output::persist_run;
use crate::types::{DeformationMode, Perturbation};

use probe::SolverProbe;

/// Timestamp format of run keys (ISO-8601 with microseconds).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Searches exclusion limits for one metric.
///
/// `E` evaluates the statistic, `D` builds the distributions. The defaults
/// evaluate the built-in statistics on Gaussian mixtures.
#[derive(Debug)]
pub struct ExclusionSolver<E = RegistryEvaluator, D = MixtureFactory> {
    search: SearchConfig,
    thresholds: ThresholdPolicy,
    evaluator: E,
    factory: D,
}

impl ExclusionSolver {
    /// Plain bisection against the last two thresholds of `metric_config`.
    pub fn bisection(metric_config: &MetricConfig, search: SearchConfig) -> Self {
        Self::new(
            search.step_policy(StepPolicy::Fixed),
            ThresholdPolicy::from_metric_config(metric_config),
            RegistryEvaluator::default(),
            MixtureFactory,
        )
    }

    /// Adaptive bisection against the last two thresholds of `metric_config`.
    pub fn adaptive_bisection(
        metric_config: &MetricConfig,
        search: SearchConfig,
        initial_division_factor: f64,
        reduce_division_factor: f64,
    ) -> Self {
        Self::new(
            search.step_policy(StepPolicy::adaptive(
                initial_division_factor,
                reduce_division_factor,
            )),
            ThresholdPolicy::from_metric_config(metric_config),
            RegistryEvaluator::default(),
            MixtureFactory,
        )
    }

    /// Plain bisection with likelihood-ratio thresholds at `confidence_levels`.
    pub fn lr_bisection(search: SearchConfig, confidence_levels: Vec<f64>) -> Self {
        Self::new(
            search.step_policy(StepPolicy::Fixed),
            ThresholdPolicy::likelihood_ratio(confidence_levels),
            RegistryEvaluator::default(),
            MixtureFactory,
        )
    }

    /// Adaptive bisection with likelihood-ratio thresholds at
    /// `confidence_levels`.
    pub fn lr_adaptive_bisection(
        search: SearchConfig,
        confidence_levels: Vec<f64>,
        initial_division_factor: f64,
        reduce_division_factor: f64,
    ) -> Self {
        Self::new(
            search.step_policy(StepPolicy::adaptive(
                initial_division_factor,
                reduce_division_factor,
            )),
            ThresholdPolicy::likelihood_ratio(confidence_levels),
            RegistryEvaluator::default(),
            MixtureFactory,
        )
    }
}

impl<E, D> ExclusionSolver<E, D>
where
    E: MetricEvaluator,
    D: DistributionFactory,
{
    /// Solver from its parts.
    pub fn new(search: SearchConfig, thresholds: ThresholdPolicy, evaluator: E, factory: D) -> Self {
        Self {
            search,
            thresholds,
            evaluator,
            factory,
        }
    }

    /// Replace the evaluator.
    pub fn with_evaluator<E2: MetricEvaluator>(self, evaluator: E2) -> ExclusionSolver<E2, D> {
        ExclusionSolver {
            search: self.search,
            thresholds: self.thresholds,
            evaluator,
            factory: self.factory,
        }
    }

    /// Replace the distribution factory.
    pub fn with_factory<D2: DistributionFactory>(self, factory: D2) -> ExclusionSolver<E, D2> {
        ExclusionSolver {
            search: self.search,
            thresholds: self.thresholds,
            evaluator: self.evaluator,
            factory,
        }
    }

    /// Search configuration.
    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Threshold source.
    pub fn threshold_policy(&self) -> &ThresholdPolicy {
        &self.thresholds
    }

    /// Evaluator.
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Run the search for `deformation`.
    ///
    /// In likelihood-ratio mode the threshold table of every probe is
    /// appended to `metric_config.threshold_history`, the configuration is
    /// rewritten to the metric configuration store and the null results go
    /// to one file per probe, whatever `save` says. Tiers that exhaust
    /// their probe budget are skipped without a record. With `save` enabled
    /// the run is merged into the exclusion store under its timestamp.
    ///
    /// # Errors
    ///
    /// Fails before the first probe on an invalid configuration or an
    /// unregistered metric. Evaluation and persistence errors abort the
    /// run; nothing is written to the exclusion store in that case.
    pub fn run(
        &mut self,
        metric_config: &mut MetricConfig,
        test_config: &TestConfig,
        deformation: DeformationMode,
    ) -> Result<RunResult> {
        self.search.validate()?;
        self.thresholds.validate()?;
        test_config.validate()?;
        metric_config.validate()?;
        self.evaluator.prepare(metric_config)?;

        if self.search.save || self.thresholds.is_likelihood_ratio() {
            fs::create_dir_all(&self.search.output_dir)
                .map_err(|e| PersistError::io(&self.search.output_dir, e))?;
        }

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let tier_count = self.thresholds.tier_count();
        let max_iterations = self.search.max_iterations;
        tracing::info!(
            "Exclusion search {}: metric={} deformation={} step={} tiers={} thresholds={}",
            timestamp,
            metric_config.name,
            deformation,
            self.search.step_policy.name(),
            tier_count,
            if self.thresholds.is_likelihood_ratio() {
                "likelihood-ratio"
            } else {
                "static"
            }
        );

        let reference = self.factory.make_mixture(
            &metric_config.mixture,
            Perturbation::NONE,
            self.search.seed_dist,
        )?;
        let scale = metric_config
            .scale
            .apply(test_config.effective_sample_size(), metric_config.mixture.ndims);
        let metric_name = metric_config.name.clone();
        let null_file = self.search.null_file_template(metric_config);

        let trace = {
            let mut probe = SolverProbe {
                evaluator: &mut self.evaluator,
                factory: &self.factory,
                reference: &reference,
                test_config,
                metric_config: &mut *metric_config,
                thresholds: &self.thresholds,
                deformation,
                seed_dist: self.search.seed_dist,
                scale,
                metrics_config_path: self.search.metrics_config_path(),
                null_file,
            };
            run_search(self.search.settings(), tier_count, &mut probe, |event| {
                log_event(&metric_name, max_iterations, event)
            })?
        };

        let exclusion_records: Vec<ExclusionRecord> = trace
            .crossings
            .iter()
            .map(|c| ExclusionRecord {
                confidence_level: c.confidence_level,
                metric_name: metric_name.clone(),
                eps_at_crossing: c.eps,
                metric_value_at_crossing: c.metric,
                elapsed_seconds: c.elapsed.as_secs_f64(),
            })
            .collect();

        tracing::info!(
            "Exclusion search {} finished: {}/{} tiers resolved, {} probes in {:.2?}",
            timestamp,
            exclusion_records.len(),
            tier_count,
            trace.probes(),
            trace.elapsed
        );

        let run = RunResult {
            timestamp,
            test_config: test_config.clone(),
            metric_config: metric_config.clone(),
            deformation,
            parameters: RunParameters::new(&self.search, &self.thresholds, &metric_config.mixture),
            exclusion_records,
            eps_trace: trace.eps_trace,
            metric_trace: trace.metric_trace,
            exhausted_tiers: trace.exhausted_tiers,
            total_elapsed_seconds: trace.elapsed.as_secs_f64(),
        };

        if self.search.save {
            persist_run(&self.search.store_path(), &run)?;
        }

        Ok(run)
    }
}

fn log_event(metric_name: &str, max_iterations: usize, event: SearchEvent<'_>) {
    match event {
        SearchEvent::Probed {
            tier,
            iteration,
            threshold,
            observation,
        } => {
            tracing::debug!(
                "[{} tier {} iter {}] eps={:.6} metric={:.6} threshold={:.6} ({} CL) interval=[{:.6}, {:.6}] rel_err_eps={:.4} rel_err_metric={:.4}",
                metric_name,
                tier,
                iteration,
                observation.eps,
                observation.metric,
                threshold.value,
                threshold.confidence_level,
                observation.interval.eps_min,
                observation.interval.eps_max,
                observation.relative_error_eps,
                observation.relative_error_metric
            );
            if observation.factor_reduced {
                tracing::debug!(
                    "Relative errors halved; division factor now {:.4}",
                    observation.division_factor
                );
            }
        }
        SearchEvent::Converged(crossing) => {
            tracing::info!(
                "{} within tolerance at {} CL: eps={:.6} metric={:.6} ({:.2?})",
                metric_name,
                crossing.confidence_level,
                crossing.eps,
                crossing.metric,
                crossing.elapsed
            );
        }
        SearchEvent::Exhausted {
            tier,
            eps_min,
            eps_max,
        } => {
            tracing::warn!(
                "{} tier {} did not converge within {} probes (interval [{:.6}, {:.6}]); skipping",
                metric_name,
                tier,
                max_iterations,
                eps_min,
                eps_max
            );
        }
    }
}
