//! Known-answer oracle: d-separation in a fixed DAG.
//!
//! The answer depends only on the graph, never on the cell values of the
//! table handed in, except for one optional refinement: with a missingness
//! prefix configured, the oracle models *test-wise deletion*. A statistical
//! test run on complete rows implicitly conditions on `R_v = observed` for
//! every involved variable `v` that has missing values, so the indicator node
//! `prefix + v` is added to the conditioning set. After deletion an indicator
//! is constant, so testing it against (or conditioning on) its own source
//! variable always answers "independent".
//!
//! d-separation is decided with the moralisation criterion: `x ⫫ y | z` iff
//! `x` and `y` are disconnected in the moral graph of the ancestral set of
//! `x ∪ y ∪ z` once `z` is removed.
use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::graphmap::UnGraphMap;
use petgraph::visit::{Dfs, Reversed};

use super::IndependenceTest;
use crate::error::TestError;
use crate::table::{Table, indicator_name};

/// d-separation oracle over a known DAG.
#[derive(Debug, Clone, Default)]
pub struct DSeparation {
    dag: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    prefix: Option<String>,
}

impl DSeparation {
    /// Creates an oracle with the given nodes and no edges.
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut oracle = Self::default();
        for node in nodes {
            oracle.node(node.as_ref());
        }
        oracle
    }

    /// Creates an oracle from a list of `parent → child` edges.
    pub fn from_edges(edges: &[(&str, &str)]) -> Self {
        let mut oracle = Self::default();
        for &(parent, child) in edges {
            oracle.add_edge(parent, child);
        }
        oracle
    }

    /// Enables test-wise deletion modelling with the given indicator prefix.
    pub fn with_missingness_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.dag.add_node(name.to_owned());
        self.index.insert(name.to_owned(), idx);
        idx
    }

    /// Adds an isolated node, if absent.
    pub fn add_node(&mut self, name: &str) {
        self.node(name);
    }

    /// Adds `parent → child`, creating both nodes if needed.
    pub fn add_edge(&mut self, parent: &str, child: &str) {
        let p = self.node(parent);
        let c = self.node(child);
        self.dag.update_edge(p, c, ());
    }

    /// Returns `true` if the DAG has a node with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn indices(&self, names: &[&str]) -> Result<Vec<NodeIndex>, TestError> {
        names
            .iter()
            .map(|&n| {
                self.index
                    .get(n)
                    .copied()
                    .ok_or_else(|| TestError::UnknownColumn(n.to_owned()))
            })
            .collect()
    }

    /// Structural d-separation of `x` and `y` given `z`.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::UnknownColumn`] for a name that is not a node.
    pub fn d_separated(&self, x: &[&str], y: &[&str], z: &[&str]) -> Result<bool, TestError> {
        let xs = self.indices(x)?;
        let ys = self.indices(y)?;
        let zs: HashSet<NodeIndex> = self.indices(z)?.into_iter().collect();

        let mut ancestral: HashSet<NodeIndex> = HashSet::new();
        for &start in xs.iter().chain(&ys).chain(&zs) {
            let mut dfs = Dfs::new(Reversed(&self.dag), start);
            while let Some(node) = dfs.next(Reversed(&self.dag)) {
                ancestral.insert(node);
            }
        }

        let mut moral: UnGraphMap<NodeIndex, ()> = UnGraphMap::new();
        for &node in &ancestral {
            if !zs.contains(&node) {
                moral.add_node(node);
            }
        }
        for &child in &ancestral {
            let parents: Vec<NodeIndex> = self
                .dag
                .neighbors_directed(child, petgraph::Direction::Incoming)
                .collect();
            for (i, &p) in parents.iter().enumerate() {
                if !zs.contains(&p) && !zs.contains(&child) {
                    moral.add_edge(p, child, ());
                }
                for &q in &parents[i + 1..] {
                    if !zs.contains(&p) && !zs.contains(&q) {
                        moral.add_edge(p, q, ());
                    }
                }
            }
        }

        for &a in &xs {
            for &b in &ys {
                if a == b {
                    return Ok(false);
                }
                if zs.contains(&a) || zs.contains(&b) {
                    continue;
                }
                if petgraph::algo::has_path_connecting(&moral, a, b, None) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

impl IndependenceTest for DSeparation {
    fn is_independent(
        &self,
        data: &Table,
        x: &[&str],
        y: &[&str],
        z: &[&str],
    ) -> Result<bool, TestError> {
        let Some(prefix) = self.prefix.as_deref() else {
            return self.d_separated(x, y, z);
        };

        let tested: HashSet<&str> = x.iter().chain(y).copied().collect();
        let mut conditioning: Vec<String> = z.iter().map(|&v| v.to_owned()).collect();

        for &v in x.iter().chain(y).chain(z) {
            if !data.column(v).is_some_and(|c| c.has_missing()) {
                continue;
            }
            let indicator = indicator_name(prefix, v);
            if tested.contains(indicator.as_str()) {
                // The indicator is constant on the rows where `v` is observed.
                return Ok(true);
            }
            if self.contains(&indicator) && !conditioning.contains(&indicator) {
                conditioning.push(indicator);
            }
        }

        let conditioning: Vec<&str> = conditioning.iter().map(String::as_str).collect();
        self.d_separated(x, y, &conditioning)
    }
}
