//! Adjacency search: PC skeleton discovery plus an optional exhaustive pass.
//!
//! # Skeleton
//!
//! Starting from the complete undirected graph over every column, each depth
//! round tests, for every remaining edge `a — b` and both orderings, the
//! subsets of size `depth` of `neighbours(first) \ {second}`. The first
//! independence found deletes the edge and its conditioning set goes into the
//! registry.
//!
//! Neighbourhoods are snapshotted when a round starts and deletions are
//! applied after every pair of the round has been decided. The result
//! therefore does not depend on the order in which pairs are visited, which
//! is what makes [`Execution::Parallel`] produce the same graph as
//! [`Execution::Sequential`].
//!
//! # Second pass
//!
//! With an imperfect oracle the skeleton search can miss separating sets made
//! of nodes adjacent to neither endpoint. [`find_more_separating_sets`]
//! revisits every non-adjacent pair that is still connected by some path and
//! records *every* independence found among subsets of the union of both
//! neighbourhoods.
use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::Execution;
use crate::context::StageContext;
use crate::error::DiscoveryError;
use crate::graph::{MarkedGraph, Pair};
use crate::report::{DiscoveryEvent, Stage};
use crate::search::{combinations, query};
use crate::sep_sets::SepSets;
use crate::table::Table;

type Neighbourhoods = HashMap<String, Vec<String>>;

fn snapshot_neighbourhoods(graph: &MarkedGraph) -> Neighbourhoods {
    graph
        .nodes()
        .into_iter()
        .map(|node| {
            let neighbours = graph
                .undirected_neighbors(node)
                .into_iter()
                .map(str::to_owned)
                .collect();
            (node.to_owned(), neighbours)
        })
        .collect()
}

fn pool<'n>(neighbourhoods: &'n Neighbourhoods, first: &str, second: &str) -> Vec<&'n str> {
    neighbourhoods
        .get(first)
        .into_iter()
        .flatten()
        .map(String::as_str)
        .filter(|&n| n != second)
        .collect()
}

/// Returns `true` if some edge has an ordering whose pool holds at least
/// `depth` candidates.
fn any_testable(graph: &MarkedGraph, depth: usize) -> bool {
    let neighbourhoods = snapshot_neighbourhoods(graph);
    graph.undirected_edges().iter().any(|(a, b)| {
        pool(&neighbourhoods, a, b).len() >= depth || pool(&neighbourhoods, b, a).len() >= depth
    })
}

/// Finds a separating set of size `depth` for the pair, trying `a` first.
fn decide_pair(
    ctx: &StageContext<'_>,
    data: &Table,
    neighbourhoods: &Neighbourhoods,
    (a, b): &Pair,
    depth: usize,
) -> Result<Option<Vec<String>>, DiscoveryError> {
    for (first, second) in [(a.as_str(), b.as_str()), (b.as_str(), a.as_str())] {
        let candidates = pool(neighbourhoods, first, second);
        if candidates.len() < depth {
            continue;
        }
        for subset in combinations(&candidates, depth) {
            let z: Vec<&str> = subset.into_iter().copied().collect();
            if query(ctx.oracle, data, &[first], &[second], &z)? {
                return Ok(Some(z.into_iter().map(str::to_owned).collect()));
            }
        }
    }
    Ok(None)
}

/// Runs the skeleton search over every column of `data`.
///
/// Returns the pruned undirected graph and the separating sets that justified
/// each deletion.
///
/// # Errors
///
/// Propagates oracle failures. [`DiscoveryError::OverlappingVariables`] cannot
/// occur here since pools never contain the tested pair.
pub fn find_skeleton(
    ctx: &StageContext<'_>,
    data: &Table,
) -> Result<(MarkedGraph, SepSets), DiscoveryError> {
    let mut graph = MarkedGraph::complete(data.column_names());
    let mut sep_sets = SepSets::new();

    for depth in 0..=ctx.config.max_depth {
        let pairs = graph.undirected_edges();
        if pairs.is_empty() || !any_testable(&graph, depth) {
            break;
        }
        ctx.emit(DiscoveryEvent::DepthStarted {
            stage: Stage::Skeleton,
            depth,
            pairs: pairs.len(),
        });

        let neighbourhoods = snapshot_neighbourhoods(&graph);
        let decisions: Vec<Option<Vec<String>>> = match ctx.config.execution {
            Execution::Sequential => pairs
                .iter()
                .map(|pair| decide_pair(ctx, data, &neighbourhoods, pair, depth))
                .collect::<Result<_, _>>()?,
            Execution::Parallel => pairs
                .par_iter()
                .map(|pair| decide_pair(ctx, data, &neighbourhoods, pair, depth))
                .collect::<Result<_, _>>()?,
        };

        for ((a, b), decision) in pairs.into_iter().zip(decisions) {
            let Some(separating_set) = decision else {
                continue;
            };
            graph.remove_undirected_edge(&a, &b);
            sep_sets.add(&a, &b, separating_set.iter().cloned());
            ctx.emit(DiscoveryEvent::EdgeRemoved {
                stage: Stage::Skeleton,
                a,
                b,
                separating_set,
            });
        }
    }

    Ok((graph, sep_sets))
}

/// Records every separating set found for non-adjacent, path-connected pairs.
///
/// Runs depth rounds from zero while some remaining undirected edge is
/// testable at that depth (the same criterion as [`find_skeleton`]). The graph
/// is not modified. Returns the number of newly recorded sets.
///
/// # Errors
///
/// Propagates oracle failures.
pub fn find_more_separating_sets(
    ctx: &StageContext<'_>,
    data: &Table,
    graph: &MarkedGraph,
    sep_sets: &mut SepSets,
) -> Result<usize, DiscoveryError> {
    let nodes = graph.nodes();
    let mut pairs: Vec<(&str, &str, Vec<&str>)> = Vec::new();
    for (i, &a) in nodes.iter().enumerate() {
        for &b in &nodes[i + 1..] {
            if graph.is_adjacent(a, b) || !graph.has_path(a, b) {
                continue;
            }
            let mut candidates: Vec<&str> = graph
                .neighbors(a)
                .into_iter()
                .chain(graph.neighbors(b))
                .filter(|&n| n != a && n != b)
                .collect();
            candidates.sort_unstable();
            candidates.dedup();
            pairs.push((a, b, candidates));
        }
    }

    let mut recorded = 0;
    let mut depth = 0;
    while any_testable(graph, depth) {
        ctx.emit(DiscoveryEvent::DepthStarted {
            stage: Stage::MoreSeparatingSets,
            depth,
            pairs: pairs.len(),
        });
        for &(a, b, ref candidates) in &pairs {
            for subset in combinations(candidates, depth) {
                let z: Vec<&str> = subset.into_iter().copied().collect();
                if query(ctx.oracle, data, &[a], &[b], &z)? && sep_sets.add(a, b, z.clone()) {
                    recorded += 1;
                    ctx.emit(DiscoveryEvent::SeparatingSetRecorded {
                        stage: Stage::MoreSeparatingSets,
                        a: a.to_owned(),
                        b: b.to_owned(),
                        separating_set: z.into_iter().map(str::to_owned).collect(),
                    });
                }
            }
        }
        depth += 1;
    }

    Ok(recorded)
}
