//! Re-testing of flagged edges on bias-corrected data.
//!
//! Each potentially extraneous edge `u — v` is tested again against subsets
//! of the substantive variables, this time on a table corrected for
//! missingness through [`DensityRatioCorrection`]. An independence on the
//! corrected table means the edge was an artefact of test-wise deletion.
use rayon::prelude::*;
use serde::Serialize;

use crate::config::Execution;
use crate::context::StageContext;
use crate::correction::DensityRatioCorrection;
use crate::error::DiscoveryError;
use crate::graph::{MarkedGraph, Pair};
use crate::report::{DiscoveryEvent, Stage};
use crate::search::{SearchMode, find_separating_sets, query};
use crate::sep_sets::SepSets;
use crate::table::{Table, is_indicator};

/// A flagged edge confirmed as spurious.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovableEdge {
    /// First endpoint, as flagged.
    pub u: String,
    /// Second endpoint, as flagged.
    pub v: String,
    /// Conditioning set under which the corrected endpoints are independent.
    pub separating_set: Vec<String>,
}

fn validate_edge(
    ctx: &StageContext<'_>,
    data: &Table,
    graph: &MarkedGraph,
    (u, v): &Pair,
) -> Result<Option<Vec<String>>, DiscoveryError> {
    let prefix = ctx.config.indicator_prefix.as_str();
    let known = |name: &str| data.has_column(name) && !is_indicator(prefix, name);
    if !known(u) || !known(v) {
        return Ok(None);
    }

    let pool: Vec<&str> = data
        .substantive_columns(prefix)
        .into_iter()
        .filter(|&c| c != u.as_str() && c != v.as_str())
        .collect();
    let correction = DensityRatioCorrection::new(data, graph, prefix).expansion(ctx.config.expansion);

    let found = find_separating_sets(&pool, ctx.config.max_depth, SearchMode::FirstOnly, |z| {
        let mut vars = vec![u.as_str(), v.as_str()];
        vars.extend_from_slice(z);
        let corrected = correction.correct(&vars)?;
        // An empty reconstruction carries no evidence of independence.
        if corrected.row_count() == 0 {
            return Ok(false);
        }
        query(ctx.oracle, &corrected, &[u.as_str()], &[v.as_str()], z)
    })?;

    Ok(found
        .into_iter()
        .next()
        .map(|set| set.into_iter().map(str::to_owned).collect()))
}

/// Returns the flagged edges found independent on corrected data and records
/// their separating sets.
///
/// Edges touching an indicator or a column absent from `data` are never
/// removable. The graph is left untouched; deleting the returned edges is up
/// to the caller.
///
/// # Errors
///
/// Propagates oracle and correction failures.
pub fn find_removable_edges(
    ctx: &StageContext<'_>,
    data: &Table,
    graph: &MarkedGraph,
    flagged: &[Pair],
    sep_sets: &mut SepSets,
) -> Result<Vec<RemovableEdge>, DiscoveryError> {
    let decisions: Vec<Option<Vec<String>>> = match ctx.config.execution {
        Execution::Sequential => flagged
            .iter()
            .map(|edge| validate_edge(ctx, data, graph, edge))
            .collect::<Result<_, _>>()?,
        Execution::Parallel => flagged
            .par_iter()
            .map(|edge| validate_edge(ctx, data, graph, edge))
            .collect::<Result<_, _>>()?,
    };

    let mut removable = Vec::new();
    for ((u, v), decision) in flagged.iter().zip(decisions) {
        let Some(separating_set) = decision else {
            continue;
        };
        sep_sets.add(u, v, separating_set.iter().cloned());
        ctx.emit(DiscoveryEvent::SeparatingSetRecorded {
            stage: Stage::EdgeRemoval,
            a: u.clone(),
            b: v.clone(),
            separating_set: separating_set.clone(),
        });
        removable.push(RemovableEdge {
            u: u.clone(),
            v: v.clone(),
            separating_set,
        });
    }
    Ok(removable)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::oracle::DSeparation;

    fn pair(a: &str, b: &str) -> Pair {
        (a.to_owned(), b.to_owned())
    }

    /// Columns a..e, `b` missing in one row. Every other row is complete.
    fn chain_data() -> Table {
        let names = ["a", "b", "c", "d", "e"];
        let full: Vec<Option<&str>> = names.iter().map(|_| Some("1")).collect();
        let mut holed = full.clone();
        holed[1] = None;
        Table::from_rows(&names, &[full.clone(), holed, full])
            .expect("valid")
            .with_missingness_indicators("MI_")
            .expect("augment")
    }

    fn chain_oracle() -> DSeparation {
        DSeparation::from_edges(&[("a", "b"), ("b", "c"), ("d", "c"), ("e", "d"), ("c", "MI_b")])
            .with_missingness_prefix("MI_")
    }

    fn chain_graph() -> MarkedGraph {
        let mut graph = MarkedGraph::new();
        for (a, b) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("b", "d")] {
            graph.add_undirected_edge(a, b);
        }
        graph.add_marked_arrow("c", "MI_b");
        graph
    }

    /// A spurious edge between marginally independent endpoints is removable
    /// with the empty set.
    #[test]
    fn test_spurious_edge_removed_with_empty_set() {
        let oracle = chain_oracle();
        let config = DiscoveryConfig::default();
        let ctx = StageContext::new(&oracle, &config);
        let mut sep_sets = SepSets::new();

        let removable = find_removable_edges(
            &ctx,
            &chain_data(),
            &chain_graph(),
            &[pair("b", "d"), pair("c", "d")],
            &mut sep_sets,
        )
        .expect("ok");

        assert_eq!(
            removable,
            vec![RemovableEdge {
                u: "b".to_owned(),
                v: "d".to_owned(),
                separating_set: Vec::new(),
            }]
        );
        assert!(sep_sets.contains("b", "d", &Default::default()));
        assert!(!sep_sets.contains_pair("c", "d"));
    }

    /// Edges touching an indicator are never candidates.
    #[test]
    fn test_indicator_edges_skipped() {
        let oracle = |_: &Table, _: &[&str], _: &[&str], _: &[&str]| true;
        let config = DiscoveryConfig::default();
        let ctx = StageContext::new(&oracle, &config);
        let mut sep_sets = SepSets::new();

        let removable = find_removable_edges(
            &ctx,
            &chain_data(),
            &chain_graph(),
            &[pair("c", "MI_b"), pair("b", "zz")],
            &mut sep_sets,
        )
        .expect("ok");
        assert!(removable.is_empty());
        assert!(sep_sets.is_empty());
    }

    /// Parallel validation finds the same edges.
    #[test]
    fn test_parallel_matches_sequential() {
        let oracle = chain_oracle();
        let flagged = [pair("b", "c"), pair("b", "d"), pair("c", "d")];
        let run = |execution| {
            let config = DiscoveryConfig {
                execution,
                ..DiscoveryConfig::default()
            };
            let ctx = StageContext::new(&oracle, &config);
            let mut sep_sets = SepSets::new();
            let removable =
                find_removable_edges(&ctx, &chain_data(), &chain_graph(), &flagged, &mut sep_sets)
                    .expect("ok");
            (removable, sep_sets)
        };
        assert_eq!(run(Execution::Sequential), run(Execution::Parallel));
    }
}
