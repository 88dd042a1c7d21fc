//! Background knowledge from time-indexed variable names.
//!
//! Variables named like `x_t=1`, `x_t=2` carry a time index. A later variable
//! cannot cause an earlier one, so any edge between two indexed variables
//! gets an arrowhead into the later one.
use regex::Regex;

use crate::context::StageContext;
use crate::graph::MarkedGraph;
use crate::report::{DiscoveryEvent, Stage};

/// The time index of `name`: the first run of digits inside the first match
/// of `pattern`.
pub fn time_index(pattern: &Regex, name: &str) -> Option<u64> {
    let found = pattern.find(name)?;
    found
        .as_str()
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())?
        .parse()
        .ok()
}

/// Orients undirected edges and unmarked arrows between time-indexed nodes.
///
/// `earlier — later` becomes `earlier → later`; `later → earlier` becomes
/// `earlier ↔ later`. Pairs with equal indices are left alone. Returns the
/// number of edges changed.
pub fn orient_by_time(ctx: &StageContext<'_>, graph: &mut MarkedGraph, pattern: &Regex) -> usize {
    let mut edges = graph.undirected_edges();
    edges.extend(graph.unmarked_arrows());

    let mut changed = 0;
    for (a, b) in edges {
        let (Some(ta), Some(tb)) = (time_index(pattern, &a), time_index(pattern, &b)) else {
            continue;
        };
        let (earlier, later) = match ta.cmp(&tb) {
            std::cmp::Ordering::Less => (a, b),
            std::cmp::Ordering::Greater => (b, a),
            std::cmp::Ordering::Equal => continue,
        };
        if graph.add_arrowhead(&earlier, &later) {
            changed += 1;
            ctx.emit(DiscoveryEvent::ArrowAdded {
                stage: Stage::TimeOrientation,
                from: earlier,
                to: later,
                marked: false,
            });
        }
    }
    changed
}
