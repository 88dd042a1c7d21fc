//! Density-ratio weighted correction of missingness bias.
//!
//! Uses the R-factorisation of Mohan & Pearl: when the missingness of each
//! variable depends only on (observed values of) its marked parents, the full
//! joint distribution is recovered from complete rows by dividing by the
//! probability of being observed,
//!
//! ```text
//!   P(g) ∝ P(g, R_G = observed) / Π_x P(R_x = observed | pa(R_x), pa observed)
//! ```
//!
//! The correction closes the requested variables `V` under "marked parents of
//! the indicator of any member with missing values" to get `G`, reweights the
//! joint counts of `G` over fully observed rows, marginalises onto `V`,
//! rescales to the original row count and expands the result into a flat table
//! of repeated rows. The corrected table shares the input's level dictionaries
//! and has no missing cells.
use std::collections::{BTreeMap, HashMap};

use crate::config::Expansion;
use crate::error::DiscoveryError;
use crate::graph::MarkedGraph;
use crate::table::{Column, Table, complete_rows, indicator_name, row_key};

/// Observation probability of one variable given its missingness parents.
struct Factor {
    /// Positions of the parents within the closed variable set.
    parents: Vec<usize>,
    /// Per parent configuration: `(rows with parents observed, of which the
    /// variable is observed too)`.
    strata: HashMap<Vec<u32>, (usize, usize)>,
}

/// Reweights a table with missing values into a complete one.
#[derive(Debug, Clone, Copy)]
pub struct DensityRatioCorrection<'a> {
    data: &'a Table,
    graph: &'a MarkedGraph,
    prefix: &'a str,
    expansion: Expansion,
}

impl<'a> DensityRatioCorrection<'a> {
    /// Corrects `data` using the marked arrows of `graph` into indicators
    /// named with `prefix`.
    pub fn new(data: &'a Table, graph: &'a MarkedGraph, prefix: &'a str) -> Self {
        Self {
            data,
            graph,
            prefix,
            expansion: Expansion::default(),
        }
    }

    /// Sets how fractional counts are turned into rows.
    pub fn expansion(mut self, expansion: Expansion) -> Self {
        self.expansion = expansion;
        self
    }

    fn column(&self, name: &str) -> Result<&'a Column, DiscoveryError> {
        self.data
            .column(name)
            .ok_or_else(|| DiscoveryError::UnknownVariable(name.to_owned()))
    }

    fn missingness_parents(&self, name: &str) -> Result<Vec<&'a str>, DiscoveryError> {
        if !self.column(name)?.has_missing() {
            return Ok(Vec::new());
        }
        let indicator = indicator_name(self.prefix, name);
        Ok(self
            .graph
            .marked_parents(&indicator)
            .into_iter()
            .filter_map(|p| self.data.column(p).map(Column::name))
            .collect())
    }

    /// `vars` (deduplicated, in the given order) followed by every variable
    /// reached through missingness parents.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UnknownVariable`] for a name that is not a
    /// column.
    pub fn closure(&self, vars: &[&str]) -> Result<Vec<&'a str>, DiscoveryError> {
        let mut closed: Vec<&'a str> = Vec::new();
        for &v in vars {
            let name = self.column(v)?.name();
            if !closed.contains(&name) {
                closed.push(name);
            }
        }
        let mut next = 0;
        while next < closed.len() {
            for parent in self.missingness_parents(closed[next])? {
                if !closed.contains(&parent) {
                    closed.push(parent);
                }
            }
            next += 1;
        }
        Ok(closed)
    }

    fn factors(&self, closed: &[&str], columns: &[&Column]) -> Result<Vec<Factor>, DiscoveryError> {
        let mut factors = Vec::new();
        for (position, &name) in closed.iter().enumerate() {
            let parents = self.missingness_parents(name)?;
            if parents.is_empty() {
                continue;
            }
            let parents: Vec<usize> = parents
                .iter()
                .filter_map(|p| closed.iter().position(|c| c == p))
                .collect();
            let parent_columns: Vec<&Column> = parents.iter().map(|&p| columns[p]).collect();
            let target = columns[position];

            let mut strata: HashMap<Vec<u32>, (usize, usize)> = HashMap::new();
            for row in 0..self.data.row_count() {
                let Some(key) = row_key(&parent_columns, row) else {
                    continue;
                };
                let entry = strata.entry(key).or_default();
                entry.0 += 1;
                if target.code(row).is_some() {
                    entry.1 += 1;
                }
            }
            factors.push(Factor { parents, strata });
        }
        Ok(factors)
    }

    /// Corrected, unscaled weights of every configuration of `vars`, keyed by
    /// level codes in `vars` order.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UnknownVariable`] for a name that is not a
    /// column.
    pub fn weights(&self, vars: &[&str]) -> Result<BTreeMap<Vec<u32>, f64>, DiscoveryError> {
        let closed = self.closure(vars)?;
        let width = self.distinct(vars);
        let columns: Vec<&Column> = closed
            .iter()
            .map(|&n| self.column(n))
            .collect::<Result<_, _>>()?;
        let factors = self.factors(&closed, &columns)?;

        let mut joint: BTreeMap<Vec<u32>, usize> = BTreeMap::new();
        for row in complete_rows(&columns, self.data.row_count()) {
            if let Some(key) = row_key(&columns, row) {
                *joint.entry(key).or_default() += 1;
            }
        }

        let mut marginal: BTreeMap<Vec<u32>, f64> = BTreeMap::new();
        'cells: for (key, count) in joint {
            let mut numerator = count as f64;
            let mut denominator = 1.0;
            for factor in &factors {
                let stratum: Vec<u32> = factor.parents.iter().map(|&p| key[p]).collect();
                match factor.strata.get(&stratum) {
                    Some(&(total, observed)) if observed > 0 => {
                        numerator *= total as f64;
                        denominator *= observed as f64;
                    }
                    Some(_) | None => continue 'cells,
                }
            }
            *marginal.entry(key[..width].to_vec()).or_default() += numerator / denominator;
        }
        Ok(marginal)
    }

    fn distinct(&self, vars: &[&str]) -> usize {
        let mut seen: Vec<&str> = Vec::new();
        for &v in vars {
            if !seen.contains(&v) {
                seen.push(v);
            }
        }
        seen.len()
    }

    /// Returns the corrected table over `vars`.
    ///
    /// Rows are emitted grouped by configuration, in code order. When no row
    /// is complete over the closed variable set the result has the requested
    /// columns and no rows.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UnknownVariable`] for a name that is not a
    /// column.
    pub fn correct(&self, vars: &[&str]) -> Result<Table, DiscoveryError> {
        let closed = self.closure(vars)?;
        let width = self.distinct(vars);
        let weights = self.weights(vars)?;
        let total: f64 = weights.values().sum();
        let scale = if total > 0.0 {
            self.data.row_count() as f64 / total
        } else {
            0.0
        };

        let mut codes: Vec<Vec<Option<u32>>> = vec![Vec::new(); width];
        for (key, weight) in &weights {
            let repeat = self.expansion.rows_for(weight * scale);
            for (column, &code) in codes.iter_mut().zip(key) {
                column.extend(std::iter::repeat_n(Some(code), repeat));
            }
        }

        let mut table = Table::new();
        for (&name, column_codes) in closed.iter().take(width).zip(codes) {
            let source = self.column(name)?;
            table.push_column(Column::from_codes(
                name.to_owned(),
                source.levels().to_vec(),
                column_codes,
            ))?;
        }
        Ok(table)
    }
}
