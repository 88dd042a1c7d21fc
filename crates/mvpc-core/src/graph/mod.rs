//! Marked-pattern graph: at most one tagged edge per unordered pair of named
//! nodes.
//!
//! A marked pattern compactly represents a set of DAGs. Four edge kinds are
//! distinguished (see [`EdgeKind`]):
//!
//! 1. marked arrow `a -*→ b`: a directed path from `a` to `b` in every
//!    underlying model;
//! 2. unmarked arrow `a → b`: a directed path from `a` to `b`, or a latent
//!    common cause;
//! 3. bidirected edge `a ↔ b`: a latent common cause;
//! 4. undirected edge `a — b`: any of the above.
//!
//! Nodes live in an arena indexed by [`NodeId`]; the adjacency structure is a
//! petgraph [`UnGraphMap`] whose edge weight is the pair's [`EdgeState`].
//!
//! Orientation only ever adds or marks arrowheads. The state transitions are
//! implemented on [`EdgeState`] and every mutator here reports whether it
//! changed anything, which the fixed-point loops rely on.
pub mod edge;


pub use edge::{EdgeKind, EdgeState, Mark, edge_distance};

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graphmap::UnGraphMap;
use serde::Serialize;

use crate::table::is_indicator;

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// A directed pair `(from, to)` of node names.
pub type DirectedPair = (String, String);

/// An unordered pair of node names, stored name-ordered.
pub type Pair = (String, String);

/// Partially oriented causal graph over named nodes.
#[derive(Debug, Clone, Default)]
pub struct MarkedGraph {
    names: Vec<Option<String>>,
    ids: HashMap<String, NodeId>,
    edges: UnGraphMap<NodeId, EdgeState>,
}

impl MarkedGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph with the given nodes and no edges.
    pub fn with_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node.as_ref());
        }
        graph
    }

    /// Creates the complete undirected graph over the given nodes.
    pub fn complete<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = Self::with_nodes(nodes);
        let ids: Vec<NodeId> = graph.edges.nodes().collect();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                graph.edges.add_edge(a, b, EdgeState::Undirected);
            }
        }
        graph
    }

    // -----------------------------------------------------------------------
    // Node arena
    // -----------------------------------------------------------------------

    fn id(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    pub(crate) fn name(&self, id: NodeId) -> &str {
        self.names
            .get(id.0)
            .and_then(Option::as_deref)
            .unwrap_or_default()
    }

    fn pair_ids(&self, a: &str, b: &str) -> Option<(NodeId, NodeId)> {
        let a = self.id(a)?;
        let b = self.id(b)?;
        (a != b).then_some((a, b))
    }

    fn ensure_node(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.id(name) {
            return id;
        }
        let id = NodeId(self.names.len());
        self.names.push(Some(name.to_owned()));
        self.ids.insert(name.to_owned(), id);
        self.edges.add_node(id);
        id
    }

    /// Adds a node. Returns `false` if it already existed.
    pub fn add_node(&mut self, name: &str) -> bool {
        if self.ids.contains_key(name) {
            return false;
        }
        self.ensure_node(name);
        true
    }

    /// Removes a node and every edge touching it. Returns `false` if absent.
    pub fn remove_node(&mut self, name: &str) -> bool {
        let Some(id) = self.ids.remove(name) else {
            return false;
        };
        self.edges.remove_node(id);
        if let Some(slot) = self.names.get_mut(id.0) {
            *slot = None;
        }
        true
    }

    /// Returns `true` if the node exists.
    pub fn contains_node(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of edges of any kind.
    pub fn edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    /// All node names, sorted.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.ids.keys().map(String::as_str).collect();
        nodes.sort_unstable();
        nodes
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Adds `a — b`, creating missing nodes. Returns `false` if the pair is
    /// already connected or `a == b`.
    pub fn add_undirected_edge(&mut self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        let a = self.ensure_node(a);
        let b = self.ensure_node(b);
        if self.edges.contains_edge(a, b) {
            return false;
        }
        self.edges.add_edge(a, b, EdgeState::Undirected);
        true
    }

    /// Removes `a — b`. Oriented edges are left alone.
    pub fn remove_undirected_edge(&mut self, a: &str, b: &str) -> bool {
        match self.state(a, b) {
            Some(EdgeState::Undirected) => self.remove_edge(a, b),
            Some(EdgeState::Arrow { .. } | EdgeState::Bidirected) | None => false,
        }
    }

    /// Removes whatever edge joins `a` and `b`.
    pub fn remove_edge(&mut self, a: &str, b: &str) -> bool {
        let Some((a, b)) = self.pair_ids(a, b) else {
            return false;
        };
        self.edges.remove_edge(a, b).is_some()
    }

    fn transition(
        &mut self,
        from: &str,
        to: &str,
        step: impl FnOnce(EdgeState, NodeId, NodeId) -> EdgeState,
    ) -> bool {
        let Some((tail, head)) = self.pair_ids(from, to) else {
            return false;
        };
        let Some(state) = self.edges.edge_weight_mut(tail, head) else {
            return false;
        };
        let next = step(*state, tail, head);
        let changed = next != *state;
        *state = next;
        changed
    }

    /// Adds a plain arrowhead into `to` on an existing connection.
    ///
    /// `from — to` becomes `from → to`; `to → from` becomes `from ↔ to`;
    /// anything that already has an arrowhead into `to` is unchanged.
    pub fn add_arrowhead(&mut self, from: &str, to: &str) -> bool {
        self.transition(from, to, |state, tail, head| state.with_arrowhead(tail, head))
    }

    /// Adds a marked arrowhead into `to` on an existing connection.
    ///
    /// `from — to` and `from → to` become `from -*→ to`. Opposing and
    /// bidirected edges are not reversed.
    pub fn add_marked_arrowhead(&mut self, from: &str, to: &str) -> bool {
        self.transition(from, to, |state, tail, head| {
            state.with_marked_arrowhead(tail, head)
        })
    }

    /// Removes the arrowhead into `to`, if present.
    pub fn clear_arrowhead(&mut self, from: &str, to: &str) -> bool {
        self.transition(from, to, |state, tail, head| {
            state.without_arrowhead(tail, head)
        })
    }

    /// Turns `from -*→ to` into `from → to`.
    pub fn unmark_arrowhead(&mut self, from: &str, to: &str) -> bool {
        self.transition(from, to, |state, _, head| state.without_mark(head))
    }

    /// Adds `from -*→ to`, creating the nodes and the connection if absent.
    pub fn add_marked_arrow(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        let tail = self.ensure_node(from);
        let head = self.ensure_node(to);
        if !self.edges.contains_edge(tail, head) {
            self.edges.add_edge(
                tail,
                head,
                EdgeState::Arrow {
                    tail,
                    head,
                    marked: true,
                },
            );
            return true;
        }
        self.add_marked_arrowhead(from, to)
    }

    /// Adds `from → to`, creating the nodes and the connection if absent.
    pub fn add_unmarked_arrow(&mut self, from: &str, to: &str) -> bool {
        let created = self.add_undirected_edge(from, to);
        self.add_arrowhead(from, to) || created
    }

    /// Adds `a ↔ b`, creating the nodes and the connection if absent.
    pub fn add_bidirected_edge(&mut self, a: &str, b: &str) -> bool {
        let created = self.add_undirected_edge(a, b);
        let forward = self.add_arrowhead(a, b);
        let backward = self.add_arrowhead(b, a);
        created || forward || backward
    }

    // -----------------------------------------------------------------------
    // Pair queries
    // -----------------------------------------------------------------------

    /// The state of the edge joining `a` and `b`, if any.
    pub fn state(&self, a: &str, b: &str) -> Option<EdgeState> {
        let (a, b) = self.pair_ids(a, b)?;
        self.edges.edge_weight(a, b).copied()
    }

    /// Kind of the edge joining `a` and `b`, if any.
    pub fn edge_kind(&self, a: &str, b: &str) -> Option<EdgeKind> {
        self.state(a, b).map(EdgeState::kind)
    }

    /// Marks found at `a` and at `b`, if the pair is connected.
    pub fn marks(&self, a: &str, b: &str) -> Option<(Mark, Mark)> {
        let (ia, ib) = self.pair_ids(a, b)?;
        let state = self.edges.edge_weight(ia, ib)?;
        Some((state.mark_at(ia), state.mark_at(ib)))
    }

    /// Returns `true` if the pair is connected by any edge.
    pub fn is_adjacent(&self, a: &str, b: &str) -> bool {
        self.state(a, b).is_some()
    }

    /// Returns `true` if `a — b`.
    pub fn has_undirected_edge(&self, a: &str, b: &str) -> bool {
        matches!(self.state(a, b), Some(EdgeState::Undirected))
    }

    /// Returns `true` if there is an arrowhead of either kind into `to` on the
    /// edge joining `from` and `to`.
    pub fn has_arrowhead(&self, from: &str, to: &str) -> bool {
        matches!(
            self.marks(from, to),
            Some((_, Mark::Arrowhead | Mark::MarkedArrowhead))
        )
    }

    /// Returns `true` if `from -*→ to`.
    pub fn has_marked_arrowhead(&self, from: &str, to: &str) -> bool {
        matches!(self.marks(from, to), Some((_, Mark::MarkedArrowhead)))
    }

    /// Returns `true` if a directed path of marked arrows leads from `from` to
    /// `to`. Every branch is explored.
    pub fn has_marked_path(&self, from: &str, to: &str) -> bool {
        let (Some(start), Some(target)) = (self.id(from), self.id(to)) else {
            return false;
        };
        let mut seen: HashSet<NodeId> = HashSet::from([start]);
        let mut queue: VecDeque<NodeId> = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for child in self.marked_children_ids(node) {
                if child == target {
                    return true;
                }
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        false
    }

    fn marked_children_ids(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .edges(node)
            .filter_map(move |(_, _, state)| match *state {
                EdgeState::Arrow {
                    tail,
                    head,
                    marked: true,
                } if tail == node => Some(head),
                EdgeState::Undirected | EdgeState::Arrow { .. } | EdgeState::Bidirected => None,
            })
    }

    /// Returns `true` if `a` and `b` are connected by a path of edges of any
    /// kind, ignoring orientation.
    pub fn has_path(&self, a: &str, b: &str) -> bool {
        let (Some(a), Some(b)) = (self.id(a), self.id(b)) else {
            return false;
        };
        petgraph::algo::has_path_connecting(&self.edges, a, b, None)
    }

    // -----------------------------------------------------------------------
    // Neighbourhoods
    // -----------------------------------------------------------------------

    fn sorted_names<'g>(&'g self, ids: impl Iterator<Item = NodeId>) -> Vec<&'g str> {
        let mut names: Vec<&str> = ids.map(|id| self.name(id)).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    fn neighbors_where(&self, node: &str, keep: impl Fn(EdgeKind) -> bool) -> Vec<&str> {
        let Some(id) = self.id(node) else {
            return Vec::new();
        };
        self.sorted_names(
            self.edges
                .edges(id)
                .filter(|(_, _, state)| keep(state.kind()))
                .map(|(_, other, _)| other),
        )
    }

    /// Nodes joined to `node` by an edge of any kind, sorted.
    pub fn neighbors(&self, node: &str) -> Vec<&str> {
        self.neighbors_where(node, |_| true)
    }

    /// Nodes joined to `node` by an undirected edge, sorted.
    pub fn undirected_neighbors(&self, node: &str) -> Vec<&str> {
        self.neighbors_where(node, |kind| kind == EdgeKind::Undirected)
    }

    /// Nodes joined to `node` by an undirected edge or a marked arrow in
    /// either direction, sorted.
    pub fn undirected_or_marked_neighbors(&self, node: &str) -> Vec<&str> {
        self.neighbors_where(node, |kind| {
            matches!(kind, EdgeKind::Undirected | EdgeKind::MarkedArrow)
        })
    }

    /// Nodes adjacent to both `a` and `b`, sorted.
    pub fn common_neighbors(&self, a: &str, b: &str) -> Vec<&str> {
        let of_b: HashSet<&str> = self.neighbors(b).into_iter().collect();
        self.neighbors(a)
            .into_iter()
            .filter(|n| of_b.contains(n))
            .collect()
    }

    /// Returns `true` if some node is adjacent to both `a` and `b`.
    pub fn has_common_neighbor(&self, a: &str, b: &str) -> bool {
        !self.common_neighbors(a, b).is_empty()
    }

    /// Tails of the marked arrows pointing into `node`, sorted.
    pub fn marked_parents(&self, node: &str) -> Vec<&str> {
        let Some(id) = self.id(node) else {
            return Vec::new();
        };
        self.sorted_names(self.edges.edges(id).filter_map(|(_, _, state)| match *state {
            EdgeState::Arrow {
                tail,
                head,
                marked: true,
            } if head == id => Some(tail),
            EdgeState::Undirected | EdgeState::Arrow { .. } | EdgeState::Bidirected => None,
        }))
    }

    // -----------------------------------------------------------------------
    // Edge listings
    // -----------------------------------------------------------------------

    fn oriented(&self, a: NodeId, b: NodeId) -> Pair {
        let (a, b) = (self.name(a), self.name(b));
        if a <= b {
            (a.to_owned(), b.to_owned())
        } else {
            (b.to_owned(), a.to_owned())
        }
    }

    fn list(&self, kind: EdgeKind) -> Vec<Pair> {
        let mut out: Vec<Pair> = self
            .edges
            .all_edges()
            .filter(|(_, _, state)| state.kind() == kind)
            .map(|(a, b, state)| match *state {
                EdgeState::Arrow { tail, head, .. } => {
                    (self.name(tail).to_owned(), self.name(head).to_owned())
                }
                EdgeState::Undirected | EdgeState::Bidirected => self.oriented(a, b),
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Undirected edges as name-ordered pairs, sorted.
    pub fn undirected_edges(&self) -> Vec<Pair> {
        self.list(EdgeKind::Undirected)
    }

    /// Unmarked arrows as `(tail, head)`, sorted.
    pub fn unmarked_arrows(&self) -> Vec<DirectedPair> {
        self.list(EdgeKind::Arrow)
    }

    /// Marked arrows as `(tail, head)`, sorted.
    pub fn marked_arrows(&self) -> Vec<DirectedPair> {
        self.list(EdgeKind::MarkedArrow)
    }

    /// Bidirected edges as name-ordered pairs, sorted.
    pub fn bidirected_edges(&self) -> Vec<Pair> {
        self.list(EdgeKind::Bidirected)
    }

    /// Every connected pair, name-ordered, sorted.
    pub fn adjacent_pairs(&self) -> Vec<Pair> {
        let mut out: Vec<Pair> = self
            .edges
            .all_edges()
            .map(|(a, b, _)| self.oriented(a, b))
            .collect();
        out.sort_unstable();
        out
    }

    /// Nodes touched by at least one edge, sorted.
    pub fn nodes_of_edges(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .edges
            .all_edges()
            .flat_map(|(a, b, _)| [self.name(a), self.name(b)])
            .collect();
        set.into_iter().collect()
    }

    /// Nodes touched by at least one undirected edge, sorted.
    pub fn nodes_of_undirected_edges(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .edges
            .all_edges()
            .filter(|(_, _, state)| state.kind() == EdgeKind::Undirected)
            .flat_map(|(a, b, _)| [self.name(a), self.name(b)])
            .collect();
        set.into_iter().collect()
    }

    /// Heads of marked arrows whose name carries `prefix`, sorted.
    pub fn missingness_indicators(&self, prefix: &str) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .edges
            .all_edges()
            .filter_map(|(_, _, state)| match *state {
                EdgeState::Arrow {
                    head, marked: true, ..
                } => Some(self.name(head)),
                EdgeState::Undirected | EdgeState::Arrow { .. } | EdgeState::Bidirected => None,
            })
            .filter(|name| is_indicator(prefix, name))
            .collect();
        set.into_iter().collect()
    }

    /// Serialisable copy of the current edge sets.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().into_iter().map(str::to_owned).collect(),
            undirected: self.undirected_edges(),
            unmarked_arrows: self.unmarked_arrows(),
            marked_arrows: self.marked_arrows(),
            bidirected: self.bidirected_edges(),
        }
    }
}

/// Point-in-time listing of a [`MarkedGraph`], suitable for JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    /// Node names, sorted.
    pub nodes: Vec<String>,
    /// Undirected edges, name-ordered.
    pub undirected: Vec<Pair>,
    /// Unmarked arrows as `(tail, head)`.
    pub unmarked_arrows: Vec<DirectedPair>,
    /// Marked arrows as `(tail, head)`.
    pub marked_arrows: Vec<DirectedPair>,
    /// Bidirected edges, name-ordered.
    pub bidirected: Vec<Pair>,
}

/// Sum of [`edge_distance`] over every pair drawn from the union of both
/// graphs' node sets.
pub fn structural_hamming_distance(left: &MarkedGraph, right: &MarkedGraph) -> usize {
    let nodes: BTreeSet<&str> = left.nodes().into_iter().chain(right.nodes()).collect();
    let nodes: Vec<&str> = nodes.into_iter().collect();
    let mut total = 0;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            total += edge_distance(left.marks(a, b), right.marks(a, b));
        }
    }
    total
}
