//! Depth-bounded search over conditioning sets.
//!
//! Every stage that looks for a separating set enumerates subsets of a
//! candidate pool by increasing size, the empty set first, and within one size
//! in lexicographic order of pool positions. [`find_separating_sets`] owns that
//! enumeration; [`query`] is the single place where a conditioning set is
//! checked against the tested variables before the oracle is consulted.
use crate::error::DiscoveryError;
use crate::oracle::IndependenceTest;
use crate::table::Table;

/// How many separating sets a search collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Stop at the first independence.
    FirstOnly,
    /// Collect every independence up to the depth bound.
    All,
}

/// Lexicographic iterator over the `k`-element subsets of a slice.
#[derive(Debug, Clone)]
pub struct Combinations<'a, T> {
    pool: &'a [T],
    indices: Vec<usize>,
    done: bool,
}

/// Returns the `k`-subsets of `pool` in lexicographic order of positions.
pub fn combinations<T>(pool: &[T], k: usize) -> Combinations<'_, T> {
    Combinations {
        pool,
        indices: (0..k).collect(),
        done: k > pool.len(),
    }
}

impl<'a, T> Iterator for Combinations<'a, T> {
    type Item = Vec<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.indices.iter().map(|&i| &self.pool[i]).collect();

        let n = self.pool.len();
        let k = self.indices.len();
        let mut advanced = false;
        for pos in (0..k).rev() {
            if self.indices[pos] < n - k + pos {
                self.indices[pos] += 1;
                for next in pos + 1..k {
                    self.indices[next] = self.indices[next - 1] + 1;
                }
                advanced = true;
                break;
            }
        }
        if !advanced {
            self.done = true;
        }
        Some(item)
    }
}

/// Rejects a query whose conditioning set overlaps the tested variables, or
/// whose two tested sides overlap.
///
/// # Errors
///
/// Returns [`DiscoveryError::OverlappingVariables`] naming the first shared
/// variable.
pub fn check_disjoint(x: &[&str], y: &[&str], z: &[&str]) -> Result<(), DiscoveryError> {
    let shared = x
        .iter()
        .find(|v| y.contains(v) || z.contains(v))
        .or_else(|| y.iter().find(|v| z.contains(v)));
    match shared {
        Some(variable) => Err(DiscoveryError::OverlappingVariables {
            variable: (*variable).to_owned(),
        }),
        None => Ok(()),
    }
}

/// Checks the query for overlap, then asks the oracle.
///
/// # Errors
///
/// Returns [`DiscoveryError::OverlappingVariables`] on overlap, or the
/// oracle's failure wrapped in [`DiscoveryError::Test`].
pub fn query<O>(
    oracle: &O,
    data: &Table,
    x: &[&str],
    y: &[&str],
    z: &[&str],
) -> Result<bool, DiscoveryError>
where
    O: IndependenceTest + ?Sized,
{
    check_disjoint(x, y, z)?;
    Ok(oracle.is_independent(data, x, y, z)?)
}

/// Runs `test` on subsets of `pool` of size `0..=min(max_depth, |pool|)`.
///
/// Returns the subsets for which `test` answered `true`, in enumeration
/// order; with [`SearchMode::FirstOnly`] at most one.
///
/// # Errors
///
/// Propagates the first error returned by `test`.
pub fn find_separating_sets<'p, F>(
    pool: &[&'p str],
    max_depth: usize,
    mode: SearchMode,
    mut test: F,
) -> Result<Vec<Vec<&'p str>>, DiscoveryError>
where
    F: FnMut(&[&str]) -> Result<bool, DiscoveryError>,
{
    let mut found = Vec::new();
    for depth in 0..=max_depth.min(pool.len()) {
        for subset in combinations(pool, depth) {
            let subset: Vec<&str> = subset.into_iter().copied().collect();
            if test(&subset)? {
                found.push(subset);
                if mode == SearchMode::FirstOnly {
                    return Ok(found);
                }
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    /// Subsets come out in lexicographic order of positions.
    #[test]
    fn test_combinations_order() {
        let pool = ["a", "b", "c", "d"];
        let pairs: Vec<Vec<&&str>> = combinations(&pool, 2).collect();
        let names: Vec<String> = pairs
            .iter()
            .map(|s| s.iter().map(|v| **v).collect::<String>())
            .collect();
        assert_eq!(names, ["ab", "ac", "ad", "bc", "bd", "cd"]);
    }

    /// Edge sizes: the empty subset once, oversize never.
    #[test]
    fn test_combinations_edge_sizes() {
        let pool = [1, 2, 3];
        assert_eq!(combinations(&pool, 0).count(), 1);
        assert_eq!(combinations(&pool, 3).count(), 1);
        assert_eq!(combinations(&pool, 4).count(), 0);
        let empty: [u8; 0] = [];
        assert_eq!(combinations(&empty, 0).count(), 1);
    }

    /// Overlap is detected on either side.
    #[test]
    fn test_check_disjoint() {
        assert!(check_disjoint(&["x"], &["y"], &["z"]).is_ok());
        assert!(matches!(
            check_disjoint(&["x"], &["y"], &["y"]),
            Err(DiscoveryError::OverlappingVariables { variable }) if variable == "y"
        ));
        assert!(check_disjoint(&["x"], &["x"], &[]).is_err());
    }

    /// First-only mode stops at the smallest separating set.
    #[test]
    fn test_first_only_stops_early() {
        let mut calls = 0;
        let found = find_separating_sets(&["a", "b", "c"], 3, SearchMode::FirstOnly, |z| {
            calls += 1;
            Ok(z == ["b"])
        })
        .expect("search");
        assert_eq!(found, vec![vec!["b"]]);
        assert_eq!(calls, 3);
    }

    /// All mode keeps searching up to the depth bound.
    #[test]
    fn test_all_mode_respects_depth() {
        let found = find_separating_sets(&["a", "b", "c"], 1, SearchMode::All, |z| {
            Ok(z.len() <= 1 && z != ["c"])
        })
        .expect("search");
        assert_eq!(found, vec![vec![], vec!["a"], vec!["b"]]);
    }

    /// Errors from the test abort the search.
    #[test]
    fn test_errors_propagate() {
        let result = find_separating_sets(&["a"], 1, SearchMode::All, |_| {
            Err(DiscoveryError::UnknownVariable("a".to_owned()))
        });
        assert!(result.is_err());
    }
}
