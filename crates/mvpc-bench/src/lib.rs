//! Random causal structures and benchmark utilities for `mvpc-core`.
//!
//! Generation is deterministic: the same [`GeneratorConfig`] always yields
//! the same DAG, so benchmark runs and property tests are reproducible.

pub mod generator;

pub use generator::{GeneratorConfig, RandomDag, SizeTier, generate_dag};
