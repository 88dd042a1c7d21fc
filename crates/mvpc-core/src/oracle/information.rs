//! Information-theoretic helpers and the G test built on them.
//!
//! All quantities are in bits and computed over *test-wise-deleted* rows: only
//! rows in which every involved variable is observed contribute.
//!
//! # G test
//!
//! For `x ⫫ y | z` the statistic is `G = 2 · N · ln 2 · I(x; y | z)` where `N`
//! is the number of complete rows and `I` the conditional mutual information
//! in bits. Under independence `G` is asymptotically chi-square distributed
//! with `Σ_s (|x|_s - 1)(|y|_s - 1)` degrees of freedom, the sum ranging over
//! the non-empty strata `s` of `z` and `|x|_s` counting the distinct `x`
//! configurations observed in `s`.
use std::collections::{HashMap, HashSet};

use super::IndependenceTest;
use crate::error::TestError;
use crate::table::{Column, Table, complete_rows, row_key};

/// Significance level used when none is configured.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

type Counts = HashMap<Vec<u32>, usize>;

fn resolve<'t>(data: &'t Table, names: &[&str]) -> Result<Vec<&'t Column>, TestError> {
    data.resolve(names).map_err(TestError::UnknownColumn)
}

fn counts(columns: &[&Column], rows: &[usize]) -> Counts {
    let mut out = Counts::new();
    for &row in rows {
        if let Some(key) = row_key(columns, row) {
            *out.entry(key).or_default() += 1;
        }
    }
    out
}

fn entropy_of(counts: &Counts, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .values()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

fn joint_entropy(columns: &[&Column], rows: &[usize]) -> f64 {
    if columns.is_empty() {
        return 0.0;
    }
    entropy_of(&counts(columns, rows), rows.len())
}

fn union<'a>(sets: &[&[&'a str]]) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for &name in sets.iter().flat_map(|s| s.iter()) {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Shannon entropy `H(variables)` over the rows where all of them are
/// observed. Zero for an empty variable list or no complete rows.
///
/// # Errors
///
/// Returns [`TestError::UnknownColumn`] for a name that is not a column.
pub fn entropy(data: &Table, variables: &[&str]) -> Result<f64, TestError> {
    let columns = resolve(data, variables)?;
    let rows = complete_rows(&columns, data.row_count());
    Ok(joint_entropy(&columns, &rows))
}

/// `H(variables | conditioning) = H(variables ∪ conditioning) - H(conditioning)`
/// over the rows where every involved variable is observed.
///
/// # Errors
///
/// Returns [`TestError::UnknownColumn`] for a name that is not a column.
pub fn conditional_entropy(
    data: &Table,
    variables: &[&str],
    conditioning: &[&str],
) -> Result<f64, TestError> {
    let all = resolve(data, &union(&[variables, conditioning]))?;
    let cond = resolve(data, conditioning)?;
    let rows = complete_rows(&all, data.row_count());
    Ok(joint_entropy(&all, &rows) - joint_entropy(&cond, &rows))
}

/// `I(x; y | z) = H(x,z) + H(y,z) - H(x,y,z) - H(z)` over the rows where every
/// involved variable is observed.
///
/// # Errors
///
/// Returns [`TestError::UnknownColumn`] for a name that is not a column.
pub fn conditional_mutual_information(
    data: &Table,
    x: &[&str],
    y: &[&str],
    z: &[&str],
) -> Result<f64, TestError> {
    let all = resolve(data, &union(&[x, y, z]))?;
    let rows = complete_rows(&all, data.row_count());
    Ok(cmi_on_rows(data, x, y, z, &rows)?.max(0.0))
}

fn cmi_on_rows(
    data: &Table,
    x: &[&str],
    y: &[&str],
    z: &[&str],
    rows: &[usize],
) -> Result<f64, TestError> {
    let xz = resolve(data, &union(&[x, z]))?;
    let yz = resolve(data, &union(&[y, z]))?;
    let xyz = resolve(data, &union(&[x, y, z]))?;
    let zs = resolve(data, z)?;
    Ok(joint_entropy(&xz, rows) + joint_entropy(&yz, rows)
        - joint_entropy(&xyz, rows)
        - joint_entropy(&zs, rows))
}

// ---------------------------------------------------------------------------
// G test
// ---------------------------------------------------------------------------

/// Likelihood-ratio independence test on categorical data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GTest {
    significance: f64,
}

impl Default for GTest {
    fn default() -> Self {
        Self {
            significance: DEFAULT_SIGNIFICANCE,
        }
    }
}

impl GTest {
    /// Creates a test at the given significance level, which must lie in
    /// `(0, 1)`; see [`crate::DiscoveryConfig::validate`].
    pub fn new(significance: f64) -> Self {
        Self { significance }
    }

    /// The configured significance level.
    pub fn significance(&self) -> f64 {
        self.significance
    }

    /// G statistic and degrees of freedom of `x ⫫ y | z`.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::UnknownColumn`] for a name that is not a column.
    pub fn statistic(
        &self,
        data: &Table,
        x: &[&str],
        y: &[&str],
        z: &[&str],
    ) -> Result<(f64, usize), TestError> {
        let all = resolve(data, &union(&[x, y, z]))?;
        let rows = complete_rows(&all, data.row_count());
        if rows.is_empty() {
            return Ok((0.0, 0));
        }

        let cmi = cmi_on_rows(data, x, y, z, &rows)?.max(0.0);
        let g = 2.0 * rows.len() as f64 * std::f64::consts::LN_2 * cmi;

        let xs = resolve(data, x)?;
        let ys = resolve(data, y)?;
        let zs = resolve(data, z)?;
        let mut strata: HashMap<Vec<u32>, (HashSet<Vec<u32>>, HashSet<Vec<u32>>)> =
            HashMap::new();
        for &row in &rows {
            let (Some(xk), Some(yk), Some(zk)) =
                (row_key(&xs, row), row_key(&ys, row), row_key(&zs, row))
            else {
                continue;
            };
            let entry = strata.entry(zk).or_default();
            entry.0.insert(xk);
            entry.1.insert(yk);
        }
        let df = strata
            .values()
            .map(|(xv, yv)| xv.len().saturating_sub(1) * yv.len().saturating_sub(1))
            .sum();
        Ok((g, df))
    }
}

impl IndependenceTest for GTest {
    fn is_independent(
        &self,
        data: &Table,
        x: &[&str],
        y: &[&str],
        z: &[&str],
    ) -> Result<bool, TestError> {
        let (g, df) = self.statistic(data, x, y, z)?;
        if df == 0 {
            return Ok(true);
        }
        Ok(g <= chi_square_quantile(1.0 - self.significance, df))
    }
}

/// Upper-tail standard normal quantile: `z` with `P(Z > z) = p`
/// (Abramowitz & Stegun 26.2.23, absolute error below 4.5e-4).
fn normal_upper_quantile(p: f64) -> f64 {
    const C: [f64; 3] = [2.515_517, 0.802_853, 0.010_328];
    const D: [f64; 3] = [1.432_788, 0.189_269, 0.001_308];

    let p = p.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);
    let (q, sign) = if p <= 0.5 { (p, 1.0) } else { (1.0 - p, -1.0) };
    let t = (-2.0 * q.ln()).sqrt();
    let num = C[0] + C[1] * t + C[2] * t * t;
    let den = 1.0 + D[0] * t + D[1] * t * t + D[2] * t * t * t;
    sign * (t - num / den)
}

/// Chi-square quantile at cumulative probability `p` (Wilson–Hilferty).
fn chi_square_quantile(p: f64, df: usize) -> f64 {
    let k = df as f64;
    let z = normal_upper_quantile(1.0 - p);
    let h = 2.0 / (9.0 * k);
    (k * (1.0 - h + z * h.sqrt()).powi(3)).max(0.0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn table(header: &[&str], rows: &[Vec<&str>]) -> Table {
        let rows: Vec<Vec<Option<&str>>> = rows
            .iter()
            .map(|r| r.iter().map(|&c| (c != "?").then_some(c)).collect())
            .collect();
        Table::from_rows(header, &rows).expect("valid table")
    }

    /// Full factorial design over two four-level variables.
    fn independent_pair(replicates: usize) -> Table {
        let mut rows = Vec::new();
        for _ in 0..replicates {
            for x in ["0", "1", "2", "3"] {
                for y in ["a", "b", "c", "d"] {
                    rows.push(vec![x, y]);
                }
            }
        }
        table(&["x", "y"], &rows)
    }

    /// A uniform four-level variable carries two bits.
    #[test]
    fn test_entropy_of_uniform_variable() {
        let data = independent_pair(1);
        let h = entropy(&data, &["x"]).expect("entropy");
        assert!((h - 2.0).abs() < 1e-12);
        let h = entropy(&data, &["x", "y"]).expect("entropy");
        assert!((h - 4.0).abs() < 1e-12);
    }

    /// Conditioning on an independent variable leaves the entropy unchanged.
    #[test]
    fn test_conditional_entropy_of_independent_variables() {
        let data = independent_pair(2);
        let h = conditional_entropy(&data, &["x"], &["y"]).expect("entropy");
        assert!((h - 2.0).abs() < 1e-12);
    }

    /// Identical variables share all their information.
    #[test]
    fn test_mutual_information_of_copy() {
        let data = table(
            &["x", "y"],
            &[vec!["0", "0"], vec!["1", "1"], vec!["0", "0"], vec!["1", "1"]],
        );
        let i = conditional_mutual_information(&data, &["x"], &["y"], &[]).expect("cmi");
        assert!((i - 1.0).abs() < 1e-12);
    }

    /// Rows missing any involved variable are dropped.
    #[test]
    fn test_testwise_deletion() {
        let data = table(
            &["x", "y"],
            &[vec!["0", "0"], vec!["1", "?"], vec!["1", "1"], vec!["?", "1"]],
        );
        let h = entropy(&data, &["x"]).expect("entropy");
        assert!((h - (3.0f64.log2() - 2.0 / 3.0)).abs() < 1e-12);
        let i = conditional_mutual_information(&data, &["x"], &["y"], &[]).expect("cmi");
        assert!((i - 1.0).abs() < 1e-12);
    }

    /// Unknown names are reported.
    #[test]
    fn test_unknown_column() {
        let data = independent_pair(1);
        let err = entropy(&data, &["nope"]).expect_err("unknown");
        assert_eq!(err, TestError::UnknownColumn("nope".to_owned()));
    }

    /// Independent variables pass; a deterministic copy fails.
    #[test]
    fn test_g_test_decisions() {
        let test = GTest::default();
        let data = independent_pair(50);
        assert!(test.is_independent(&data, &["x"], &["y"], &[]).expect("test"));

        let mut rows = Vec::new();
        for _ in 0..30 {
            rows.push(vec!["0", "0"]);
            rows.push(vec!["1", "1"]);
        }
        let copy = table(&["x", "y"], &rows);
        assert!(!test.is_independent(&copy, &["x"], &["y"], &[]).expect("test"));
    }

    /// Conditioning on the common cause removes the dependence.
    #[test]
    fn test_g_test_conditional_independence() {
        let mut rows = Vec::new();
        for _ in 0..40 {
            for x in ["0", "1"] {
                for y in ["0", "1"] {
                    rows.push(vec![x, y, "0"]);
                }
            }
        }
        for _ in 0..160 {
            rows.push(vec!["1", "1", "1"]);
        }
        let data = table(&["x", "y", "z"], &rows);
        let test = GTest::default();
        assert!(!test.is_independent(&data, &["x"], &["y"], &[]).expect("test"));
        assert!(test.is_independent(&data, &["x"], &["y"], &["z"]).expect("test"));
    }

    /// Constant data has no degrees of freedom and counts as independent.
    #[test]
    fn test_zero_degrees_of_freedom() {
        let data = table(&["x", "y"], &[vec!["0", "1"], vec!["0", "0"]]);
        let test = GTest::default();
        assert_eq!(
            test.statistic(&data, &["x"], &["y"], &[]).expect("stat").1,
            0
        );
        assert!(test.is_independent(&data, &["x"], &["y"], &[]).expect("test"));
    }

    /// Quantile approximations stay close to tabulated values.
    #[test]
    fn test_quantile_approximations() {
        assert!((normal_upper_quantile(0.05) - 1.644_854).abs() < 1e-3);
        assert!((normal_upper_quantile(0.975) + 1.959_964).abs() < 1e-3);
        assert!((chi_square_quantile(0.95, 1) - 3.841).abs() < 0.15);
        assert!((chi_square_quantile(0.95, 9) - 16.919).abs() < 0.05);
    }
}
