//! Unshielded colliders.
//!
//! `u — c — v` with `u` and `v` non-adjacent is a collider `u → c ← v`
//! exactly when `c` is not in a separating set of `u` and `v`.
use serde::Serialize;

use crate::context::StageContext;
use crate::graph::MarkedGraph;
use crate::report::{DiscoveryEvent, Stage};
use crate::sep_sets::SepSets;

/// `left → collider ← right`, with `left < right`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Immorality {
    /// The parent that sorts first.
    pub left: String,
    /// Common neighbour receiving both arrowheads.
    pub collider: String,
    /// The other parent.
    pub right: String,
}

/// Finds every immorality of `graph`, sorted.
///
/// Only undirected edges take part. All immoralities are read off the same
/// graph state, so the result does not depend on the order of application.
pub fn find_immoralities(graph: &MarkedGraph, sep_sets: &SepSets) -> Vec<Immorality> {
    let nodes = graph.nodes_of_undirected_edges();
    let mut found = Vec::new();
    for (i, &u) in nodes.iter().enumerate() {
        let of_u = graph.undirected_neighbors(u);
        for &v in &nodes[i + 1..] {
            if graph.is_adjacent(u, v) {
                continue;
            }
            for c in graph.undirected_neighbors(v) {
                if of_u.contains(&c) && !sep_sets.separates_with(u, v, c) {
                    found.push(Immorality {
                        left: u.to_owned(),
                        collider: c.to_owned(),
                        right: v.to_owned(),
                    });
                }
            }
        }
    }
    found.sort_unstable();
    found
}

/// Orients each immorality as `left → collider ← right`.
///
/// Two immoralities pointing into each other's collider produce a
/// bidirected edge. Returns the number of arrowheads added.
pub fn apply_immoralities(
    ctx: &StageContext<'_>,
    graph: &mut MarkedGraph,
    immoralities: &[Immorality],
) -> usize {
    let mut added = 0;
    for immorality in immoralities {
        for parent in [&immorality.left, &immorality.right] {
            if graph.add_arrowhead(parent, &immorality.collider) {
                added += 1;
                ctx.emit(DiscoveryEvent::ArrowAdded {
                    stage: Stage::Immoralities,
                    from: parent.clone(),
                    to: immorality.collider.clone(),
                    marked: false,
                });
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::sep_sets::SepSet;

    fn immorality(left: &str, collider: &str, right: &str) -> Immorality {
        Immorality {
            left: left.to_owned(),
            collider: collider.to_owned(),
            right: right.to_owned(),
        }
    }

    fn chain() -> MarkedGraph {
        let mut graph = MarkedGraph::new();
        graph.add_undirected_edge("x", "c");
        graph.add_undirected_edge("c", "y");
        graph
    }

    /// A middle node outside the separating set is a collider.
    #[test]
    fn test_unshielded_collider_found() {
        let mut sep_sets = SepSets::new();
        sep_sets.add("x", "y", SepSet::new());
        assert_eq!(
            find_immoralities(&chain(), &sep_sets),
            vec![immorality("x", "c", "y")]
        );
    }

    /// A middle node in any separating set is not.
    #[test]
    fn test_separating_middle_is_not_collider() {
        let mut sep_sets = SepSets::new();
        sep_sets.add("x", "y", SepSet::new());
        sep_sets.add("x", "y", ["c"]);
        assert!(find_immoralities(&chain(), &sep_sets).is_empty());
    }

    /// Shielded triples are skipped.
    #[test]
    fn test_shielded_triple_skipped() {
        let mut graph = chain();
        graph.add_undirected_edge("x", "y");
        assert!(find_immoralities(&graph, &SepSets::new()).is_empty());
    }

    /// Applying orients both edges into the collider.
    #[test]
    fn test_apply_orients_into_collider() {
        let oracle = |_: &crate::Table, _: &[&str], _: &[&str], _: &[&str]| true;
        let config = DiscoveryConfig::default();
        let ctx = StageContext::new(&oracle, &config);
        let mut graph = chain();

        let added = apply_immoralities(&ctx, &mut graph, &[immorality("x", "c", "y")]);
        assert_eq!(added, 2);
        assert_eq!(
            graph.unmarked_arrows(),
            vec![
                ("x".to_owned(), "c".to_owned()),
                ("y".to_owned(), "c".to_owned())
            ]
        );
        assert_eq!(apply_immoralities(&ctx, &mut graph, &[immorality("x", "c", "y")]), 0);
    }

    /// Two overlapping immoralities meet in a bidirected edge.
    #[test]
    fn test_overlapping_immoralities_bidirect() {
        // a — b — c — d, with a ⫫ c and b ⫫ d marginally.
        let mut graph = MarkedGraph::new();
        graph.add_undirected_edge("a", "b");
        graph.add_undirected_edge("b", "c");
        graph.add_undirected_edge("c", "d");
        let mut sep_sets = SepSets::new();
        sep_sets.add("a", "c", SepSet::new());
        sep_sets.add("b", "d", SepSet::new());
        sep_sets.add("a", "d", SepSet::new());

        let found = find_immoralities(&graph, &sep_sets);
        assert_eq!(
            found,
            vec![immorality("a", "b", "c"), immorality("b", "c", "d")]
        );

        let oracle = |_: &crate::Table, _: &[&str], _: &[&str], _: &[&str]| true;
        let config = DiscoveryConfig::default();
        apply_immoralities(&StageContext::new(&oracle, &config), &mut graph, &found);
        assert_eq!(graph.bidirected_edges(), vec![("b".to_owned(), "c".to_owned())]);
    }
}
