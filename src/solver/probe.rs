//! Adapter from the metric evaluator to the tier search.
//!
//! One probe at `eps`:
//!
//! 1. Build the perturbed mixture from the run seed.
//! 2. Fixed thresholds: evaluate reference against perturbed.
//! 3. Likelihood-ratio thresholds: evaluate the null hypothesis with the full
//!    test configuration, write it to the null file, derive the threshold
//!    table, record it and rewrite the metric configuration store, then
//!    evaluate the alternative with `alt_niter` batches.
//! 4. Scale the mean of the result column.

use std::path::PathBuf;

use exclusion_core::{build_threshold_table, Probe, Probed, ThresholdTier};

use crate::config::{MetricConfig, TestConfig, ThresholdHistoryEntry, ThresholdPolicy};
use crate::distribution::DistributionFactory;
use crate::error::{Error, MetricError};
use crate::metric::{EvaluationMode, EvaluationRequest, MetricEvaluator, ResultSet};
use crate::output::{null_file_path, save_metrics_config};
use crate::types::{DeformationMode, Perturbation};

pub(crate) struct SolverProbe<'a, E, D: DistributionFactory> {
    pub evaluator: &'a mut E,
    pub factory: &'a D,
    pub reference: &'a D::Output,
    pub test_config: &'a TestConfig,
    pub metric_config: &'a mut MetricConfig,
    pub thresholds: &'a ThresholdPolicy,
    pub deformation: DeformationMode,
    pub seed_dist: u64,
    /// Factor applied to the column mean.
    pub scale: f64,
    /// Metric configuration store, rewritten after every null evaluation.
    pub metrics_config_path: PathBuf,
    /// Template for the per-probe null result files.
    pub null_file: PathBuf,
}

impl<E, D> SolverProbe<'_, E, D>
where
    E: MetricEvaluator,
    D: DistributionFactory,
{
    fn evaluate(
        &mut self,
        perturbed: &D::Output,
        perturbation: Perturbation,
        test_config: &TestConfig,
        mode: EvaluationMode,
    ) -> Result<ResultSet, Error> {
        let request = EvaluationRequest {
            reference: self.reference,
            perturbed,
            perturbation,
            test_config,
            metric_config: &*self.metric_config,
            mode,
        };
        self.evaluator.evaluate(&request)
    }

    fn scaled_mean(&self, results: &ResultSet) -> Result<f64, MetricError> {
        Ok(results.column_mean(&self.metric_config.result_key)? * self.scale)
    }

    fn null_thresholds(
        &mut self,
        perturbed: &D::Output,
        perturbation: Perturbation,
        eps: f64,
        confidence_levels: &[f64],
    ) -> Result<Vec<ThresholdTier>, Error> {
        let test_config = self.test_config;
        let results = self.evaluate(perturbed, perturbation, test_config, EvaluationMode::Null)?;

        let path = null_file_path(&self.null_file, self.deformation, eps);
        results.save_to_json(&path)?;
        tracing::debug!("Saved null results to {}", path.display());

        let null: Vec<f64> = results
            .get(&self.metric_config.result_key)?
            .iter()
            .map(|v| v * self.scale)
            .collect();
        if null.is_empty() {
            return Err(MetricError::EmptyNullSample.into());
        }

        let table = build_threshold_table(&null, confidence_levels);
        tracing::debug!(
            "Null thresholds at eps={}: {:?}",
            eps,
            table
                .iter()
                .map(|t| (t.confidence_level, t.value))
                .collect::<Vec<_>>()
        );

        self.metric_config.threshold_history.push(ThresholdHistoryEntry {
            eps,
            deformation: self.deformation,
            thresholds: table.clone(),
        });
        save_metrics_config(&self.metrics_config_path, self.metric_config)?;

        Ok(table)
    }
}

impl<E, D> Probe for SolverProbe<'_, E, D>
where
    E: MetricEvaluator,
    D: DistributionFactory,
{
    type Error = Error;

    fn probe(&mut self, eps: f64, tier: usize) -> Result<Probed, Error> {
        let perturbation = self.deformation.perturbation(eps);
        let perturbed =
            self.factory
                .make_mixture(&self.metric_config.mixture, perturbation, self.seed_dist)?;

        let thresholds = self.thresholds;
        match thresholds {
            ThresholdPolicy::Static(tiers) => {
                let test_config = self.test_config;
                let results =
                    self.evaluate(&perturbed, perturbation, test_config, EvaluationMode::Standard)?;
                Ok(Probed {
                    metric: self.scaled_mean(&results)?,
                    threshold: tiers[tier],
                })
            }
            ThresholdPolicy::LikelihoodRatio {
                confidence_levels,
                alt_niter,
            } => {
                let table = self.null_thresholds(&perturbed, perturbation, eps, confidence_levels)?;
                let alt_config = TestConfig {
                    niter: *alt_niter,
                    ..self.test_config.clone()
                };
                let results =
                    self.evaluate(&perturbed, perturbation, &alt_config, EvaluationMode::Alternative)?;
                Ok(Probed {
                    metric: self.scaled_mean(&results)?,
                    threshold: table[tier],
                })
            }
        }
    }
}
