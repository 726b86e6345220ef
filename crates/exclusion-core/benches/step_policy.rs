use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exclusion_core::{
    run_search, FnProbe, SearchInterval, SearchSettings, StepPolicy, ThresholdTier, Tolerances,
};

fn settings(step_policy: StepPolicy) -> SearchSettings {
    SearchSettings {
        eps_bounds: SearchInterval::new(0.0, 1.0),
        tolerances: Tolerances::new(1e-4, 1e-4),
        max_iterations: 200,
        step_policy,
    }
}

fn bench_step_policy(c: &mut Criterion) {
    let tiers = [
        ThresholdTier::new(0.68, 1.0),
        ThresholdTier::new(0.95, 2.0),
        ThresholdTier::new(0.99, 3.0),
    ];

    let mut group = c.benchmark_group("run_search");
    for (label, policy) in [
        ("bisection", StepPolicy::Fixed),
        ("adaptive_0.8_1.2", StepPolicy::adaptive(0.8, 1.2)),
    ] {
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut probe = FnProbe::new(&tiers, |eps: f64| (100.0 * eps).ln_1p());
                let trace = run_search(settings(policy), tiers.len(), &mut probe, |_| {});
                match trace {
                    Ok(trace) => black_box(trace.probes()),
                    Err(never) => match never {},
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_step_policy);
criterion_main!(benches);
