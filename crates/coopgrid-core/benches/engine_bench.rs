use coopgrid_core::{AdaptationPolicy, CoopGridConfig, SimulationEngine};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::time::Duration;

fn bench_engine_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_step");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(8));
    // Steps per bench iteration (override via CG_BENCH_STEPS).
    let steps: usize = std::env::var("CG_BENCH_STEPS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(8);

    for &grid_len in &[50usize, 100] {
        for policy in [
            AdaptationPolicy::BestOfNine,
            AdaptationPolicy::StrictImprovement,
        ] {
            group.bench_function(format!("len{grid_len}_{policy:?}_steps{steps}"), |b| {
                b.iter_batched(
                    || {
                        let config = CoopGridConfig {
                            grid_len,
                            init_coop: 0.5,
                            special_init: false,
                            rng_seed: Some(0xBEEF),
                            policy,
                            ..CoopGridConfig::default()
                        };
                        SimulationEngine::new(config).expect("engine")
                    },
                    |mut engine| {
                        for _ in 0..steps {
                            engine.step();
                        }
                        engine
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_engine_steps);
criterion_main!(benches);
