//! Propagation of orientations to a fixed point.
//!
//! Two rules are applied over every ordered pair `(u, v)` of nodes that touch
//! an edge, until a full pass changes nothing:
//!
//! 1. `u`, `v` non-adjacent with a common neighbour `c`, `u → c`, no
//!    arrowhead `v → c` and not yet `c -*→ v`: add `c -*→ v`. Otherwise
//!    `u → c ← v` would be a collider that the immorality stage missed.
//! 2. `u`, `v` adjacent, no arrowhead into `v`, and a marked path `u ⇒ v`:
//!    add `u → v`, since `v → u` would close a cycle.
//!
//! Every application adds an arrowhead and none removes one, so the loop
//! terminates.
use crate::context::StageContext;
use crate::graph::MarkedGraph;
use crate::report::{DiscoveryEvent, Stage};

fn rule_one(ctx: &StageContext<'_>, graph: &mut MarkedGraph, u: &str, v: &str) -> usize {
    let candidates: Vec<String> = graph
        .common_neighbors(u, v)
        .into_iter()
        .filter(|&c| graph.has_arrowhead(u, c))
        .map(str::to_owned)
        .collect();

    let mut applied = 0;
    for c in candidates {
        if graph.has_arrowhead(v, &c) || graph.has_marked_arrowhead(&c, v) {
            continue;
        }
        if graph.add_marked_arrowhead(&c, v) {
            applied += 1;
            ctx.emit(DiscoveryEvent::ArrowAdded {
                stage: Stage::Orientation,
                from: c,
                to: v.to_owned(),
                marked: true,
            });
        }
    }
    applied
}

fn rule_two(ctx: &StageContext<'_>, graph: &mut MarkedGraph, u: &str, v: &str) -> usize {
    if graph.has_arrowhead(u, v) || !graph.has_marked_path(u, v) {
        return 0;
    }
    if !graph.add_arrowhead(u, v) {
        return 0;
    }
    ctx.emit(DiscoveryEvent::ArrowAdded {
        stage: Stage::Orientation,
        from: u.to_owned(),
        to: v.to_owned(),
        marked: false,
    });
    1
}

/// Applies both rules until nothing changes and returns the number of
/// arrowheads added. Running it again on its own output returns zero.
pub fn orient_edges(ctx: &StageContext<'_>, graph: &mut MarkedGraph) -> usize {
    let nodes: Vec<String> = graph
        .nodes_of_edges()
        .into_iter()
        .map(str::to_owned)
        .collect();

    let mut total = 0;
    loop {
        let mut pass = 0;
        for u in &nodes {
            for v in nodes.iter().filter(|&v| v != u) {
                pass += if graph.is_adjacent(u, v) {
                    rule_two(ctx, graph, u, v)
                } else {
                    rule_one(ctx, graph, u, v)
                };
            }
        }
        if pass == 0 {
            return total;
        }
        total += pass;
    }
}
