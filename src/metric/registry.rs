//! Metric registry and the batch-running evaluator built on it.

use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{
    EvaluationRequest, KsMean, LikelihoodRatio, MetricEvaluator, MetricKind, ResultSet,
    SlicedWasserstein, TwoSampleMetric,
};
use crate::config::MetricConfig;
use crate::error::{ConfigError, MetricError};
use crate::random::RandomContext;

/// Builds a statistic from its configuration.
pub type MetricConstructor =
    Box<dyn Fn(&MetricConfig) -> Result<Box<dyn TwoSampleMetric>, ConfigError> + Send + Sync>;

/// Maps a [`MetricKind`] to the constructor of its statistic.
pub struct MetricRegistry {
    constructors: HashMap<MetricKind, MetricConstructor>,
}

impl MetricRegistry {
    /// Registry with no statistics.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with the three built-in statistics.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(MetricKind::KsMean, |_| Ok(Box::new(KsMean)));
        registry.register(MetricKind::SlicedWasserstein, |config| {
            let nslices = usize_kwarg(config, "nslices")?
                .unwrap_or(super::sliced_wasserstein::DEFAULT_NSLICES);
            if nslices == 0 {
                return Err(ConfigError::InvalidKwarg {
                    key: "nslices".to_string(),
                    message: "must be positive".to_string(),
                });
            }
            Ok(Box::new(SlicedWasserstein::new(nslices)))
        });
        registry.register(MetricKind::LikelihoodRatio, |_| Ok(Box::new(LikelihoodRatio)));
        registry
    }

    /// Register (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: MetricKind, constructor: F)
    where
        F: Fn(&MetricConfig) -> Result<Box<dyn TwoSampleMetric>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(kind, Box::new(constructor));
    }

    /// Whether `kind` has a constructor.
    pub fn contains(&self, kind: MetricKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Build the statistic selected by `config`.
    pub fn build(&self, config: &MetricConfig) -> Result<Box<dyn TwoSampleMetric>, ConfigError> {
        let constructor = self
            .constructors
            .get(&config.kind)
            .ok_or_else(|| ConfigError::UnregisteredMetric(config.kind.to_string()))?;
        constructor(config)
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.constructors.keys().map(|k| k.name()).collect();
        kinds.sort_unstable();
        f.debug_struct("MetricRegistry").field("kinds", &kinds).finish()
    }
}

fn usize_kwarg(config: &MetricConfig, key: &str) -> Result<Option<usize>, ConfigError> {
    match config.kwargs.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| ConfigError::InvalidKwarg {
                key: key.to_string(),
                message: format!("expected a non-negative integer, got {value}"),
            }),
    }
}

/// Evaluator running registry statistics over independent batches.
///
/// Batch `b` samples from `RandomContext::new(seed).fork(b)`, so every
/// evaluation of a run sees the same streams and the values do not depend
/// on thread scheduling. At most `max_vectorize` batches are in flight at
/// once.
#[derive(Debug, Default)]
pub struct RegistryEvaluator {
    registry: MetricRegistry,
}

impl RegistryEvaluator {
    /// Evaluator over `registry`.
    pub fn new(registry: MetricRegistry) -> Self {
        Self { registry }
    }

    /// Underlying registry.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }
}

impl MetricEvaluator for RegistryEvaluator {
    fn prepare(&mut self, metric_config: &MetricConfig) -> Result<(), ConfigError> {
        self.registry.build(metric_config).map(|_| ())
    }

    fn evaluate(&mut self, request: &EvaluationRequest<'_>) -> crate::Result<ResultSet> {
        let metric = self.registry.build(request.metric_config)?;
        let pair = request.pair();
        let batch_size = request.test_config.batch_size_test;
        let niter = request.test_config.niter;
        let chunk = request.metric_config.max_vectorize.max(1);
        let root = RandomContext::new(request.test_config.seed);

        let run_batch = |b: usize| -> Result<f64, MetricError> {
            let mut rng = root.fork(b as u64);
            metric.batch_statistic(&pair, batch_size, &mut rng)
        };

        let mut values = Vec::with_capacity(niter);
        for start in (0..niter).step_by(chunk) {
            let end = (start + chunk).min(niter);

            #[cfg(feature = "parallel")]
            let batch: Result<Vec<f64>, MetricError> =
                (start..end).into_par_iter().map(run_batch).collect();

            #[cfg(not(feature = "parallel"))]
            let batch: Result<Vec<f64>, MetricError> = (start..end).map(run_batch).collect();

            values.extend(batch?);
        }

        tracing::debug!(
            "Evaluated {} ({:?}): {} batches of {} points",
            metric.column(),
            request.mode,
            niter,
            batch_size
        );

        Ok(ResultSet::new(request.metric_config.kind.name(), request.mode, batch_size)
            .with_column(metric.column(), values))
    }
}
