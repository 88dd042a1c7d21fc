//! Generated structures are well formed and usable by the discovery pipeline.
#![allow(clippy::expect_used)]

use std::sync::Arc;

use mvpc_bench::{GeneratorConfig, SizeTier, generate_dag};
use mvpc_core::{DiscoveryConfig, Mvpc, NullReporter, StageContext, find_skeleton};
use proptest::prelude::*;

#[test]
fn generation_is_deterministic() {
    for seed in [1, 42, 999] {
        let config = SizeTier::Medium.config(seed);
        assert_eq!(generate_dag(&config), generate_dag(&config));
    }
}

#[test]
fn edges_point_forward() {
    for tier in [SizeTier::Small, SizeTier::Medium, SizeTier::Large] {
        let dag = generate_dag(&tier.config(42));
        assert!(dag.edges.iter().all(|&(parent, child)| parent < child));
        assert!(dag.missingness.iter().all(|&(v, parent)| v != parent));
    }
}

#[test]
fn table_marks_missing_variables() {
    let dag = generate_dag(&GeneratorConfig {
        seed: 3,
        num_variables: 10,
        edge_probability: 0.2,
        missing_probability: 1.0,
    });
    let table = dag.table().expect("valid table");
    assert_eq!(table.columns_with_missing().len(), 10);
    assert_eq!(table.row_count(), 3);
}

#[test]
fn pipeline_runs_on_every_tier() {
    for tier in [SizeTier::Small, SizeTier::Medium] {
        let dag = generate_dag(&tier.config(5));
        let output = Mvpc::new(dag.oracle(), DiscoveryConfig::default())
            .with_reporter(Arc::new(NullReporter))
            .discover(&dag.table().expect("valid table"))
            .expect("discovery");
        assert!(output.graph.node_count() >= dag.names.len());
    }
}

proptest! {
    /// Without missing values the skeleton matches the generated adjacencies.
    #[test]
    fn complete_data_skeleton_matches(seed in any::<u64>()) {
        let dag = generate_dag(&GeneratorConfig {
            seed,
            num_variables: 7,
            edge_probability: 0.3,
            missing_probability: 0.0,
        });
        let table = dag.table().expect("valid table");
        let oracle = dag.oracle();
        let config = DiscoveryConfig { max_depth: 7, ..DiscoveryConfig::default() };
        let (graph, _) = find_skeleton(&StageContext::new(&oracle, &config), &table)
            .expect("skeleton");

        let mut expected: Vec<(String, String)> = dag
            .edges
            .iter()
            .map(|&(a, b)| (dag.names[a].clone(), dag.names[b].clone()))
            .collect();
        expected.sort_unstable();
        prop_assert_eq!(graph.undirected_edges(), expected);
    }
}
