//! Registry of separating sets, keyed by unordered node pair.
//!
//! Every conditioning set for which the oracle reported independence of a pair
//! is recorded. The registry only grows; later stages (immorality detection in
//! particular) read it to decide whether a common neighbour separates a pair.
use std::collections::{BTreeMap, BTreeSet};

use serde::ser::{Serialize, Serializer};

/// A conditioning set.
pub type SepSet = BTreeSet<String>;

/// Name-ordered unordered pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct NodePair(String, String);

impl NodePair {
    fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_owned(), b.to_owned())
        } else {
            Self(b.to_owned(), a.to_owned())
        }
    }
}

/// Separating sets found so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SepSets {
    sets: BTreeMap<NodePair, BTreeSet<SepSet>>,
}

impl SepSets {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `set` separates `a` and `b`. Returns `false` if it was
    /// already known.
    pub fn add<I, S>(&mut self, a: &str, b: &str, set: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: SepSet = set.into_iter().map(Into::into).collect();
        self.sets.entry(NodePair::new(a, b)).or_default().insert(set)
    }

    /// Every set recorded for the pair, in sorted order.
    pub fn get<'s>(&'s self, a: &str, b: &str) -> impl Iterator<Item = &'s SepSet> + use<'s> {
        self.sets.get(&NodePair::new(a, b)).into_iter().flatten()
    }

    /// Returns `true` if at least one set is recorded for the pair.
    pub fn contains_pair(&self, a: &str, b: &str) -> bool {
        self.sets.contains_key(&NodePair::new(a, b))
    }

    /// Returns `true` if `set` is recorded for the pair.
    pub fn contains(&self, a: &str, b: &str, set: &SepSet) -> bool {
        self.sets
            .get(&NodePair::new(a, b))
            .is_some_and(|sets| sets.contains(set))
    }

    /// Returns `true` if `node` belongs to any set recorded for the pair.
    pub fn separates_with(&self, a: &str, b: &str, node: &str) -> bool {
        self.get(a, b).any(|set| set.contains(node))
    }

    /// Number of pairs with at least one recorded set.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Iterates over `(a, b, sets)` with `a <= b`, in pair order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &BTreeSet<SepSet>)> {
        self.sets
            .iter()
            .map(|(pair, sets)| (pair.0.as_str(), pair.1.as_str(), sets))
    }

    /// Adds every entry of `other` to this registry.
    pub fn extend(&mut self, other: SepSets) {
        for (pair, sets) in other.sets {
            self.sets.entry(pair).or_default().extend(sets);
        }
    }
}

#[derive(serde::Serialize)]
struct SepSetEntry<'a> {
    pair: [&'a str; 2],
    sets: &'a BTreeSet<SepSet>,
}

impl Serialize for SepSets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|(a, b, sets)| SepSetEntry {
            pair: [a, b],
            sets,
        }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn set(items: &[&str]) -> SepSet {
        items.iter().map(|&s| s.to_owned()).collect()
    }

    /// Pairs are unordered.
    #[test]
    fn test_pair_order_is_irrelevant() {
        let mut reg = SepSets::new();
        assert!(reg.add("y", "x", ["z"]));
        assert!(!reg.add("x", "y", ["z"]));
        assert!(reg.contains("x", "y", &set(&["z"])));
        assert!(reg.contains_pair("y", "x"));
        assert_eq!(reg.len(), 1);
    }

    /// The empty set is a legitimate separating set.
    #[test]
    fn test_empty_set_recorded() {
        let mut reg = SepSets::new();
        reg.add("a", "b", std::iter::empty::<String>());
        assert!(reg.contains("b", "a", &SepSet::new()));
        assert!(!reg.separates_with("a", "b", "c"));
    }

    /// Membership search spans all sets of the pair.
    #[test]
    fn test_separates_with_any_set() {
        let mut reg = SepSets::new();
        reg.add("a", "b", ["c"]);
        reg.add("a", "b", ["d", "e"]);
        assert!(reg.separates_with("b", "a", "e"));
        assert!(!reg.separates_with("a", "b", "f"));
        assert_eq!(reg.get("a", "b").count(), 2);
        assert_eq!(reg.get("a", "q").count(), 0);
    }

    /// Merging keeps sets from both sides.
    #[test]
    fn test_extend_merges() {
        let mut left = SepSets::new();
        left.add("a", "b", ["c"]);
        let mut right = SepSets::new();
        right.add("b", "a", ["d"]);
        right.add("x", "y", std::iter::empty::<String>());
        left.extend(right);
        assert_eq!(left.len(), 2);
        assert_eq!(left.get("a", "b").count(), 2);
    }

    /// Serialises as a list of `{pair, sets}` entries in pair order.
    #[test]
    fn test_serialises_as_entry_list() {
        let mut reg = SepSets::new();
        reg.add("b", "a", ["c"]);
        let json = serde_json::to_value(&reg).expect("serialise");
        assert_eq!(json, serde_json::json!([{"pair": ["a", "b"], "sets": [["c"]]}]));
    }
}
