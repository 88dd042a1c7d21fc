//! Detection of potentially extraneous edges.
//!
//! Test-wise deletion conditions every test on the missingness indicators of
//! the variables involved. When an indicator is a descendant of a collider,
//! that conditioning can make two otherwise separated variables look
//! dependent, leaving a spurious edge in the skeleton:
//!
//! ```text
//!   X → Z ← Y        Z -*→ R_W        test X ⫫ Y | W  (deletes on R_W)
//! ```
//!
//! An edge is flagged when its endpoints share a neighbour, neighbourhoods
//! being taken over undirected edges and marked arrows. The check is
//! conservative: flagged edges are only candidates, re-tested on
//! corrected data by [`crate::removal`].
use std::collections::BTreeSet;

use crate::context::StageContext;
use crate::graph::{MarkedGraph, Pair};
use crate::report::DiscoveryEvent;

/// Returns the undirected edges whose endpoints share a neighbour, sorted.
///
/// Without marked arrows (no discovered cause of missingness) the data is
/// treated as missing completely at random and nothing is flagged.
pub fn find_potentially_extraneous_edges(ctx: &StageContext<'_>, graph: &MarkedGraph) -> Vec<Pair> {
    if graph.marked_arrows().is_empty() {
        return Vec::new();
    }

    let mut flagged = Vec::new();
    for (a, b) in graph.undirected_edges() {
        let of_a: BTreeSet<&str> = graph
            .undirected_or_marked_neighbors(&a)
            .into_iter()
            .filter(|&n| n != b)
            .collect();
        let shares = graph
            .undirected_or_marked_neighbors(&b)
            .into_iter()
            .any(|n| n != a && of_a.contains(n));
        if shares {
            ctx.emit(DiscoveryEvent::EdgeFlagged {
                a: a.clone(),
                b: b.clone(),
            });
            flagged.push((a, b));
        }
    }
    flagged
}
