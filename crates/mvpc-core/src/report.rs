//! Progress reporting.
//!
//! Stages describe what they do as [`DiscoveryEvent`]s handed to a
//! [`Reporter`]. The library never installs a subscriber or prints anything:
//! [`TracingReporter`] forwards events to whatever `tracing` subscriber the
//! host application configured, and [`NullReporter`] drops them.
//!
//! Events are emitted from the calling thread only, after any parallel round
//! has joined, so reporters see them in a deterministic order.
use serde::Serialize;
use tracing::{debug, info};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Adjacency search from the complete graph.
    Skeleton,
    /// Exhaustive second pass recording more separating sets.
    MoreSeparatingSets,
    /// Marked arrows into missingness indicators.
    MissingnessCauses,
    /// Flagging edges that may be induced by test-wise deletion.
    ExtraneousEdges,
    /// Re-testing flagged edges on corrected data.
    EdgeRemoval,
    /// Unshielded colliders.
    Immoralities,
    /// Arrowheads implied by time indices.
    TimeOrientation,
    /// Rule propagation to a fixed point.
    Orientation,
}

impl Stage {
    /// Stable snake-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Skeleton => "skeleton",
            Stage::MoreSeparatingSets => "more_separating_sets",
            Stage::MissingnessCauses => "missingness_causes",
            Stage::ExtraneousEdges => "extraneous_edges",
            Stage::EdgeRemoval => "edge_removal",
            Stage::Immoralities => "immoralities",
            Stage::TimeOrientation => "time_orientation",
            Stage::Orientation => "orientation",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiscoveryEvent {
    /// A stage began.
    StageStarted {
        /// The stage.
        stage: Stage,
    },
    /// A stage ended.
    StageFinished {
        /// The stage.
        stage: Stage,
        /// Edges of any kind left in the graph.
        edges: usize,
    },
    /// A depth round of a separating-set search began.
    DepthStarted {
        /// The stage running the search.
        stage: Stage,
        /// Conditioning-set size of this round.
        depth: usize,
        /// Pairs considered in this round.
        pairs: usize,
    },
    /// A separating set was found and the edge deleted.
    EdgeRemoved {
        /// The stage that removed it.
        stage: Stage,
        /// One endpoint.
        a: String,
        /// The other endpoint.
        b: String,
        /// The separating set.
        separating_set: Vec<String>,
    },
    /// A separating set was recorded without a graph change.
    SeparatingSetRecorded {
        /// The stage that recorded it.
        stage: Stage,
        /// One endpoint.
        a: String,
        /// The other endpoint.
        b: String,
        /// The separating set.
        separating_set: Vec<String>,
    },
    /// An edge was flagged as potentially extraneous.
    EdgeFlagged {
        /// One endpoint.
        a: String,
        /// The other endpoint.
        b: String,
    },
    /// An arrowhead was added.
    ArrowAdded {
        /// The stage that added it.
        stage: Stage,
        /// Tail side.
        from: String,
        /// Head side.
        to: String,
        /// Whether the arrowhead is marked.
        marked: bool,
    },
}

/// Receiver of [`DiscoveryEvent`]s.
pub trait Reporter: Send + Sync {
    /// Called once per event, on the thread driving the pipeline.
    fn on_event(&self, event: &DiscoveryEvent);
}

/// Forwards events to `tracing`: stage boundaries at `INFO`, everything else
/// at `DEBUG`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn on_event(&self, event: &DiscoveryEvent) {
        match event {
            DiscoveryEvent::StageStarted { stage } => {
                info!(stage = stage.as_str(), "mvpc.stage.started");
            }
            DiscoveryEvent::StageFinished { stage, edges } => {
                info!(stage = stage.as_str(), edges, "mvpc.stage.finished");
            }
            DiscoveryEvent::DepthStarted {
                stage,
                depth,
                pairs,
            } => {
                debug!(stage = stage.as_str(), depth, pairs, "mvpc.search.depth");
            }
            DiscoveryEvent::EdgeRemoved {
                stage,
                a,
                b,
                separating_set,
            } => {
                debug!(
                    stage = stage.as_str(),
                    %a,
                    %b,
                    separating_set = ?separating_set,
                    "mvpc.edge.removed"
                );
            }
            DiscoveryEvent::SeparatingSetRecorded {
                stage,
                a,
                b,
                separating_set,
            } => {
                debug!(
                    stage = stage.as_str(),
                    %a,
                    %b,
                    separating_set = ?separating_set,
                    "mvpc.sep_set.recorded"
                );
            }
            DiscoveryEvent::EdgeFlagged { a, b } => {
                debug!(%a, %b, "mvpc.edge.flagged");
            }
            DiscoveryEvent::ArrowAdded {
                stage,
                from,
                to,
                marked,
            } => {
                debug!(
                    stage = stage.as_str(),
                    %from,
                    %to,
                    marked,
                    "mvpc.arrow.added"
                );
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn on_event(&self, _event: &DiscoveryEvent) {}
}

/// Collects events in memory. Handy in tests and for post-run inspection.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: std::sync::Mutex<Vec<DiscoveryEvent>>,
}

impl CollectingReporter {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events received so far.
    pub fn events(&self) -> Vec<DiscoveryEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Reporter for CollectingReporter {
    fn on_event(&self, event: &DiscoveryEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    /// Events are recorded in arrival order.
    #[test]
    fn test_collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::new();
        reporter.on_event(&DiscoveryEvent::StageStarted {
            stage: Stage::Skeleton,
        });
        reporter.on_event(&DiscoveryEvent::StageFinished {
            stage: Stage::Skeleton,
            edges: 3,
        });
        let events = reporter.events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            DiscoveryEvent::StageFinished {
                stage: Stage::Skeleton,
                edges: 3
            }
        );
    }

    /// The tracing and null reporters accept every event without a
    /// subscriber installed.
    #[test]
    fn test_reporters_accept_events_without_subscriber() {
        let event = DiscoveryEvent::ArrowAdded {
            stage: Stage::Orientation,
            from: "a".to_owned(),
            to: "b".to_owned(),
            marked: true,
        };
        TracingReporter.on_event(&event);
        NullReporter.on_event(&event);
    }

    /// Events serialise with a snake-case tag.
    #[test]
    fn test_event_serialisation() {
        let json = serde_json::to_value(DiscoveryEvent::EdgeFlagged {
            a: "x".to_owned(),
            b: "y".to_owned(),
        })
        .expect("serialise");
        assert_eq!(json["event"], "edge_flagged");
        assert_eq!(Stage::EdgeRemoval.to_string(), "edge_removal");
    }
}
