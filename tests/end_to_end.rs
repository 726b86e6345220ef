//! Full runs on Gaussian mixtures with the built-in statistics.
//!
//! Sample sizes are kept small; assertions check structure and persistence
//! rather than exact crossing points.

use exclusion_limits::output::{load_metrics_config, ExclusionStore};
use exclusion_limits::{
    DeformationMode, ExclusionSolver, MetricConfig, MetricKind, MetricScale, MixtureConfig,
    SearchConfig, TestConfig, ThresholdTier,
};

fn small_test() -> TestConfig {
    TestConfig::new().batch_size_test(300).niter(6).seed(11)
}

#[test]
fn ks_run_is_persisted_and_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let shape = MixtureConfig { ncomp: 2, ndims: 2 };
    let thresholds = vec![ThresholdTier::new(0.95, 0.15), ThresholdTier::new(0.99, 0.25)];
    let search = SearchConfig::quick().seed_dist(5).output_dir(dir.path());

    let mut config = MetricConfig::new(MetricKind::KsMean, shape)
        .scale(MetricScale::Identity)
        .thresholds(thresholds.clone());
    let mut solver = ExclusionSolver::adaptive_bisection(&config, search.clone(), 0.8, 1.2);
    let first = solver
        .run(&mut config, &small_test(), DeformationMode::Mean)
        .unwrap();

    assert_eq!(first.exclusion_records.len() + first.exhausted_tiers.len(), 2);
    assert!(first.eps_trace.iter().all(|&eps| (0.0..=1.0).contains(&eps)));
    assert!(first.metric_trace.iter().all(|m| m.is_finite() && *m >= 0.0));
    for pair in first.exclusion_records.windows(2) {
        assert!(pair[0].eps_at_crossing <= pair[1].eps_at_crossing);
    }

    let stored = ExclusionStore::in_dir(dir.path())
        .get(&first.timestamp)
        .unwrap()
        .unwrap();
    assert_eq!(stored.eps_trace, first.eps_trace);
    assert_eq!(stored.parameters.seed_dist, 5);

    // Same seeds, same probes.
    let mut again = MetricConfig::new(MetricKind::KsMean, shape)
        .scale(MetricScale::Identity)
        .thresholds(thresholds);
    let mut solver = ExclusionSolver::adaptive_bisection(&again, search.save(false), 0.8, 1.2);
    let second = solver
        .run(&mut again, &small_test(), DeformationMode::Mean)
        .unwrap();
    assert_eq!(second.eps_trace, first.eps_trace);
    assert_eq!(second.metric_trace, first.metric_trace);
}

#[test]
fn likelihood_ratio_run_on_mixtures() {
    let dir = tempfile::tempdir().unwrap();
    let shape = MixtureConfig { ncomp: 2, ndims: 2 };
    let mut config = MetricConfig::new(MetricKind::LikelihoodRatio, shape)
        .null_file(dir.path().join("null_lr.json"));
    let search = SearchConfig::quick()
        .max_iterations(8)
        .output_dir(dir.path());
    let mut solver = ExclusionSolver::lr_bisection(search, vec![0.95]);

    let run = solver
        .run(&mut config, &TestConfig::new().batch_size_test(200).niter(20), DeformationMode::Std)
        .unwrap();

    assert!(run.probes() > 0);
    assert_eq!(config.threshold_history.len(), run.probes());
    assert!(config
        .threshold_history
        .iter()
        .all(|entry| entry.thresholds.len() == 1 && entry.thresholds[0].index_bounds.is_some()));
    assert!(dir.path().join("null_lr_std_0.500000.json").exists());

    let saved = load_metrics_config(&dir.path().join("metrics_config.json"), "lr_statistic")
        .unwrap()
        .unwrap();
    assert_eq!(saved.threshold_history, config.threshold_history);
}

#[test]
fn sliced_wasserstein_unreachable_threshold_climbs() {
    let shape = MixtureConfig { ncomp: 2, ndims: 3 };
    let mut config = MetricConfig::new(MetricKind::SlicedWasserstein, shape)
        .kwarg("nslices", 20)
        .scale(MetricScale::Identity)
        .thresholds(vec![ThresholdTier::new(0.95, 1e6)]);
    let search = SearchConfig::quick().max_iterations(6).save(false);
    let mut solver = ExclusionSolver::bisection(&config, search);

    // Every probe falls short, so each one raises the floor.
    let run = solver
        .run(&mut config, &small_test(), DeformationMode::Both)
        .unwrap();
    assert!(run.exclusion_records.is_empty());
    assert_eq!(run.exhausted_tiers, vec![0]);
    for pair in run.eps_trace.windows(2) {
        assert!(pair[1] > pair[0]);
    }
}
