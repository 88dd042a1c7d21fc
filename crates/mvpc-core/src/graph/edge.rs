//! Tagged per-pair edge state and its endpoint view.
use serde::Serialize;

use super::NodeId;

/// State of the single edge joining an unordered pair of nodes.
///
/// The absence of an edge is represented by the pair being absent from the
/// adjacency map, never by a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeState {
    /// `a — b`.
    Undirected,
    /// `tail → head`, or `tail -*→ head` when `marked`.
    Arrow {
        /// Endpoint carrying no arrowhead.
        tail: NodeId,
        /// Endpoint carrying the arrowhead.
        head: NodeId,
        /// `true` if the arrowhead is marked.
        marked: bool,
    },
    /// `a ↔ b`.
    Bidirected,
}

/// Mark found at one endpoint of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    /// No arrowhead.
    Tail,
    /// Plain arrowhead.
    Arrowhead,
    /// Marked arrowhead.
    MarkedArrowhead,
}

impl Mark {
    fn has_arrowhead(self) -> bool {
        match self {
            Mark::Tail => false,
            Mark::Arrowhead | Mark::MarkedArrowhead => true,
        }
    }

    fn is_marked(self) -> bool {
        match self {
            Mark::Tail | Mark::Arrowhead => false,
            Mark::MarkedArrowhead => true,
        }
    }
}

/// Edge categories used for listing and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// `a — b`.
    Undirected,
    /// `a → b`.
    Arrow,
    /// `a -*→ b`.
    MarkedArrow,
    /// `a ↔ b`.
    Bidirected,
}

impl EdgeState {
    /// Listing category of this edge.
    pub fn kind(self) -> EdgeKind {
        match self {
            EdgeState::Undirected => EdgeKind::Undirected,
            EdgeState::Arrow { marked: false, .. } => EdgeKind::Arrow,
            EdgeState::Arrow { marked: true, .. } => EdgeKind::MarkedArrow,
            EdgeState::Bidirected => EdgeKind::Bidirected,
        }
    }

    /// Mark at the `at` endpoint. `at` must be one of the edge's endpoints.
    pub fn mark_at(self, at: NodeId) -> Mark {
        match self {
            EdgeState::Undirected => Mark::Tail,
            EdgeState::Bidirected => Mark::Arrowhead,
            EdgeState::Arrow { head, marked, .. } if head == at => {
                if marked {
                    Mark::MarkedArrowhead
                } else {
                    Mark::Arrowhead
                }
            }
            EdgeState::Arrow { .. } => Mark::Tail,
        }
    }

    /// State after adding a plain arrowhead into `head` on the edge
    /// `tail … head`.
    pub(crate) fn with_arrowhead(self, tail: NodeId, head: NodeId) -> Self {
        match self {
            EdgeState::Undirected => EdgeState::Arrow {
                tail,
                head,
                marked: false,
            },
            EdgeState::Arrow { head: h, .. } if h == head => self,
            EdgeState::Arrow { .. } | EdgeState::Bidirected => EdgeState::Bidirected,
        }
    }

    /// State after adding a marked arrowhead into `head`. Opposing and
    /// bidirected edges are left untouched.
    pub(crate) fn with_marked_arrowhead(self, tail: NodeId, head: NodeId) -> Self {
        match self {
            EdgeState::Undirected => EdgeState::Arrow {
                tail,
                head,
                marked: true,
            },
            EdgeState::Arrow { head: h, .. } if h == head => EdgeState::Arrow {
                tail,
                head,
                marked: true,
            },
            EdgeState::Arrow { .. } | EdgeState::Bidirected => self,
        }
    }

    /// State after removing the arrowhead into `head`, if any.
    pub(crate) fn without_arrowhead(self, tail: NodeId, head: NodeId) -> Self {
        match self {
            EdgeState::Arrow { head: h, .. } if h == head => EdgeState::Undirected,
            EdgeState::Bidirected => EdgeState::Arrow {
                tail: head,
                head: tail,
                marked: false,
            },
            EdgeState::Undirected | EdgeState::Arrow { .. } => self,
        }
    }

    /// State after removing the mark of the arrowhead into `head`, if any.
    pub(crate) fn without_mark(self, head: NodeId) -> Self {
        match self {
            EdgeState::Arrow {
                tail,
                head: h,
                marked: true,
            } if h == head => EdgeState::Arrow {
                tail,
                head,
                marked: false,
            },
            EdgeState::Undirected | EdgeState::Arrow { .. } | EdgeState::Bidirected => self,
        }
    }
}

/// Edit distance between two views of the same pair `(a, b)`.
///
/// Each view is `None` for "no edge" or the marks found at `a` and `b`.
/// Differing adjacency costs 1; at each endpoint, differing arrowhead
/// presence costs 1 and differing marks cost 1. A missing edge counts as
/// tails at both ends.
pub fn edge_distance(left: Option<(Mark, Mark)>, right: Option<(Mark, Mark)>) -> usize {
    let adjacency = usize::from(left.is_some() != right.is_some());
    let (la, lb) = left.unwrap_or((Mark::Tail, Mark::Tail));
    let (ra, rb) = right.unwrap_or((Mark::Tail, Mark::Tail));
    adjacency + endpoint_distance(la, ra) + endpoint_distance(lb, rb)
}

fn endpoint_distance(left: Mark, right: Mark) -> usize {
    usize::from(left.has_arrowhead() != right.has_arrowhead())
        + usize::from(left.is_marked() != right.is_marked())
}
