//! Full discovery runs over generated structures with missing values.
#![allow(clippy::expect_used)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mvpc_bench::{SizeTier, generate_dag};
use mvpc_core::{DiscoveryConfig, Execution, Mvpc, NullReporter};

fn bench_discover(c: &mut Criterion) {
    let mut group = c.benchmark_group("discover");
    group.sample_size(20);

    for (name, tier) in [("S", SizeTier::Small), ("M", SizeTier::Medium)] {
        let dag = generate_dag(&tier.config(7));
        let table = dag.table().expect("valid table");

        for (mode, execution) in [
            ("sequential", Execution::Sequential),
            ("parallel", Execution::Parallel),
        ] {
            let config = DiscoveryConfig {
                execution,
                ..DiscoveryConfig::default()
            };
            let mvpc = Mvpc::new(dag.oracle(), config).with_reporter(Arc::new(NullReporter));
            group.bench_function(BenchmarkId::new(mode, name), |b| {
                b.iter(|| mvpc.discover(&table).expect("discovery"));
            });
        }
    }

    group.finish();
}

fn bench_with_second_pass(c: &mut Criterion) {
    let dag = generate_dag(&SizeTier::Small.config(11));
    let table = dag.table().expect("valid table");
    let config = DiscoveryConfig {
        find_more_separating_sets: true,
        ..DiscoveryConfig::default()
    };
    let mvpc = Mvpc::new(dag.oracle(), config).with_reporter(Arc::new(NullReporter));

    c.bench_function("discover/second_pass/S", |b| {
        b.iter(|| mvpc.discover(&table).expect("discovery"));
    });
}

criterion_group!(benches, bench_discover, bench_with_second_pass);
criterion_main!(benches);
