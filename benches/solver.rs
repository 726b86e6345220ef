use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exclusion_limits::{
    DeformationMode, ExclusionSolver, MetricConfig, MetricKind, MixtureConfig, SearchConfig,
    TestConfig, ThresholdTier,
};

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("exclusion_solver");
    group.sample_size(10);

    let shape = MixtureConfig { ncomp: 2, ndims: 2 };
    let test_config = TestConfig::new().batch_size_test(500).niter(8);
    let search = SearchConfig::quick().save(false);

    for kind in [MetricKind::KsMean, MetricKind::SlicedWasserstein] {
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                // Small samples keep a full two-tier run in the millisecond range.
                let mut metric = MetricConfig::new(kind, shape)
                    .kwarg("nslices", 10)
                    .thresholds(vec![
                        ThresholdTier::new(0.95, 0.1),
                        ThresholdTier::new(0.99, 0.2),
                    ]);
                let mut solver = ExclusionSolver::adaptive_bisection(&metric, search.clone(), 0.8, 1.2);
                match solver.run(&mut metric, &test_config, DeformationMode::Mean) {
                    Ok(run) => black_box(run.probes()),
                    Err(_) => 0,
                }
            });
        });
    }

    // Likelihood-ratio runs always write their null files and metric config.
    let scratch = tempfile::tempdir().unwrap();
    let lr_search = search.clone().output_dir(scratch.path());
    group.bench_function("likelihood_ratio", |b| {
        b.iter(|| {
            let mut metric = MetricConfig::new(MetricKind::LikelihoodRatio, shape);
            let mut solver = ExclusionSolver::lr_bisection(lr_search.clone(), vec![0.95]);
            match solver.run(&mut metric, &test_config, DeformationMode::Std) {
                Ok(run) => black_box(run.probes()),
                Err(_) => 0,
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_solver);
criterion_main!(benches);
