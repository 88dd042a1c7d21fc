//! Seeded random DAG generator.
//!
//! Variables `v0 … v{n-1}` are taken in index order and every edge points from
//! a lower to a higher index, so the result is acyclic by construction. A
//! configurable share of variables gets missing values, each missingness
//! indicator receiving one or two random observed parents.

use mvpc_core::{DSeparation, Table, TableError, indicator_name};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Indicator prefix used by generated oracles and tables.
pub const PREFIX: &str = "MI_";

/// Configuration for [`generate_dag`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Seed for the random number generator.
    pub seed: u64,
    /// Number of substantive variables.
    pub num_variables: usize,
    /// Probability of each forward edge `vi → vj`.
    pub edge_probability: f64,
    /// Probability that a variable has missing values.
    pub missing_probability: f64,
}

/// Predefined sizes for benchmarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    /// 8 variables, sparse.
    Small,
    /// 16 variables.
    Medium,
    /// 28 variables.
    Large,
}

impl SizeTier {
    /// Returns the default `GeneratorConfig` for this size tier.
    pub fn config(self, seed: u64) -> GeneratorConfig {
        let (num_variables, edge_probability) = match self {
            SizeTier::Small => (8, 0.3),
            SizeTier::Medium => (16, 0.2),
            SizeTier::Large => (28, 0.12),
        };
        GeneratorConfig {
            seed,
            num_variables,
            edge_probability,
            missing_probability: 0.25,
        }
    }
}

/// A generated structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomDag {
    /// Substantive variable names, in index order.
    pub names: Vec<String>,
    /// `(parent, child)` index pairs among substantive variables.
    pub edges: Vec<(usize, usize)>,
    /// `(variable, parent)`: `parent` causes the missingness of `variable`.
    pub missingness: Vec<(usize, usize)>,
}

impl RandomDag {
    /// Indices of the variables with missing values, sorted.
    pub fn with_missing(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.missingness.iter().map(|&(v, _)| v).collect();
        out.dedup();
        out
    }

    /// A d-separation oracle over the structure, indicators included.
    pub fn oracle(&self) -> DSeparation {
        let mut oracle = DSeparation::new(&self.names).with_missingness_prefix(PREFIX);
        for &(parent, child) in &self.edges {
            oracle.add_edge(&self.names[parent], &self.names[child]);
        }
        for &(variable, parent) in &self.missingness {
            oracle.add_edge(
                &self.names[parent],
                &indicator_name(PREFIX, &self.names[variable]),
            );
        }
        oracle
    }

    /// A three-row table: two complete rows, then one with every variable of
    /// [`RandomDag::with_missing`] absent.
    ///
    /// # Errors
    ///
    /// Never in practice; propagates [`Table::from_rows`] failures.
    pub fn table(&self) -> Result<Table, TableError> {
        let zeros: Vec<Option<&str>> = self.names.iter().map(|_| Some("0")).collect();
        let ones: Vec<Option<&str>> = self.names.iter().map(|_| Some("1")).collect();
        let mut holed = ones.clone();
        for v in self.with_missing() {
            holed[v] = None;
        }
        Table::from_rows(&self.names, &[zeros, ones, holed])
    }
}

/// Generates a DAG from `config`.
pub fn generate_dag(config: &GeneratorConfig) -> RandomDag {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.num_variables;
    let names: Vec<String> = (0..n).map(|i| format!("v{i}")).collect();

    let mut edges = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            if rng.gen_bool(config.edge_probability) {
                edges.push((i, j));
            }
        }
    }

    let mut missingness = Vec::new();
    if n > 1 {
        for v in 0..n {
            if !rng.gen_bool(config.missing_probability) {
                continue;
            }
            let first = pick_other(&mut rng, n, v);
            missingness.push((v, first));
            if rng.gen_bool(0.5) {
                let second = pick_other(&mut rng, n, v);
                if second != first {
                    missingness.push((v, second));
                }
            }
        }
    }

    RandomDag {
        names,
        edges,
        missingness,
    }
}

/// A uniformly drawn index in `0..n` other than `skip`. Requires `n > 1`.
fn pick_other(rng: &mut StdRng, n: usize, skip: usize) -> usize {
    let drawn = rng.gen_range(0..n - 1);
    if drawn >= skip { drawn + 1 } else { drawn }
}
