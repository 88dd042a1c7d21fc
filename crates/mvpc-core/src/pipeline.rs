//! The end-to-end discovery run.
//!
//! [`Mvpc::discover`] augments the input with missingness indicators and
//! chains the stages:
//!
//! 1. skeleton search, optionally followed by the exhaustive second pass;
//! 2. missingness causes;
//! 3. potentially extraneous edges, re-tested on corrected data and deleted
//!    when found spurious;
//! 4. immoralities;
//! 5. time-based orientation, when a time pattern is configured;
//! 6. orientation propagation.
use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::config::DiscoveryConfig;
use crate::context::StageContext;
use crate::error::DiscoveryError;
use crate::extraneous::find_potentially_extraneous_edges;
use crate::graph::{GraphSnapshot, MarkedGraph, Pair};
use crate::immoralities::{Immorality, apply_immoralities, find_immoralities};
use crate::missingness::{MissingnessCause, find_missingness_causes};
use crate::oracle::{GTest, IndependenceTest};
use crate::orientation::orient_edges;
use crate::removal::{RemovableEdge, find_removable_edges};
use crate::report::{DiscoveryEvent, Reporter, Stage, TracingReporter};
use crate::sep_sets::SepSets;
use crate::skeleton::{find_more_separating_sets, find_skeleton};
use crate::table::Table;
use crate::time_orientation::orient_by_time;

/// The graph as it stood after one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSnapshot {
    /// The stage that just finished.
    pub stage: Stage,
    /// Edges as they stood at that point.
    pub graph: GraphSnapshot,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct DiscoveryOutput {
    /// The final marked pattern.
    pub graph: MarkedGraph,
    /// Separating sets from every stage that records them.
    pub sep_sets: SepSets,
    /// The input augmented with missingness indicators.
    pub data: Table,
    /// Discovered `(parent, indicator)` marked arrows.
    pub missingness_causes: Vec<MissingnessCause>,
    /// Edges flagged for re-testing.
    pub potentially_extraneous: Vec<Pair>,
    /// Flagged edges confirmed spurious and deleted.
    pub removed: Vec<RemovableEdge>,
    /// Unshielded colliders, as found before orientation.
    pub immoralities: Vec<Immorality>,
    /// Edges changed by time-based orientation.
    pub time_orientations: usize,
    /// Arrowheads added by orientation propagation.
    pub orientations: usize,
    /// Per-stage graphs, when requested.
    pub snapshots: Vec<StageSnapshot>,
}

#[derive(Serialize)]
struct OutputReport<'a> {
    graph: GraphSnapshot,
    sep_sets: &'a SepSets,
    missingness_causes: &'a [MissingnessCause],
    potentially_extraneous: &'a [Pair],
    removed: &'a [RemovableEdge],
    immoralities: &'a [Immorality],
    time_orientations: usize,
    orientations: usize,
    snapshots: &'a [StageSnapshot],
}

impl DiscoveryOutput {
    /// Serialises everything but the augmented table as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Json`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, DiscoveryError> {
        let report = OutputReport {
            graph: self.graph.snapshot(),
            sep_sets: &self.sep_sets,
            missingness_causes: &self.missingness_causes,
            potentially_extraneous: &self.potentially_extraneous,
            removed: &self.removed,
            immoralities: &self.immoralities,
            time_orientations: self.time_orientations,
            orientations: self.orientations,
            snapshots: &self.snapshots,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

/// Missing-value-aware marked-pattern discovery.
pub struct Mvpc {
    oracle: Box<dyn IndependenceTest>,
    config: DiscoveryConfig,
    reporter: Arc<dyn Reporter>,
}

impl Mvpc {
    /// Runs discovery with `oracle`, reporting through [`TracingReporter`].
    pub fn new(oracle: impl IndependenceTest + 'static, config: DiscoveryConfig) -> Self {
        Self {
            oracle: Box::new(oracle),
            config,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Runs discovery with the built-in [`GTest`] at the configured
    /// significance level.
    pub fn with_g_test(config: DiscoveryConfig) -> Self {
        let oracle = GTest::new(config.significance);
        Self::new(oracle, config)
    }

    /// Replaces the reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// The configuration runs are made with.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discovers the marked pattern of `table`.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::InvalidConfig`] and
    ///   [`DiscoveryError::InvalidTimePattern`] for a bad configuration.
    /// - [`DiscoveryError::Table`] if a column name starts with the indicator
    ///   prefix.
    /// - Any oracle failure.
    #[instrument(
        name = "mvpc.discover",
        skip_all,
        fields(rows = table.row_count(), columns = table.column_count())
    )]
    pub fn discover(&self, table: &Table) -> Result<DiscoveryOutput, DiscoveryError> {
        self.config.validate()?;
        let time_pattern = self.config.time_regex()?;
        let data = table.with_missingness_indicators(&self.config.indicator_prefix)?;
        let ctx = StageContext::new(self.oracle.as_ref(), &self.config)
            .with_reporter(self.reporter.as_ref());
        let mut run = Run {
            ctx: &ctx,
            snapshots: Vec::new(),
        };

        run.start(Stage::Skeleton);
        let (mut graph, mut sep_sets) = find_skeleton(&ctx, &data)?;
        run.finish(Stage::Skeleton, &graph);

        if self.config.find_more_separating_sets {
            run.start(Stage::MoreSeparatingSets);
            find_more_separating_sets(&ctx, &data, &graph, &mut sep_sets)?;
            run.finish(Stage::MoreSeparatingSets, &graph);
        }

        run.start(Stage::MissingnessCauses);
        let missingness_causes = find_missingness_causes(&ctx, &data, &mut graph)?;
        run.finish(Stage::MissingnessCauses, &graph);

        run.start(Stage::ExtraneousEdges);
        let potentially_extraneous = find_potentially_extraneous_edges(&ctx, &graph);
        run.finish(Stage::ExtraneousEdges, &graph);

        run.start(Stage::EdgeRemoval);
        let removed =
            find_removable_edges(&ctx, &data, &graph, &potentially_extraneous, &mut sep_sets)?;
        for edge in &removed {
            if graph.remove_undirected_edge(&edge.u, &edge.v) {
                ctx.emit(DiscoveryEvent::EdgeRemoved {
                    stage: Stage::EdgeRemoval,
                    a: edge.u.clone(),
                    b: edge.v.clone(),
                    separating_set: edge.separating_set.clone(),
                });
            }
        }
        run.finish(Stage::EdgeRemoval, &graph);

        run.start(Stage::Immoralities);
        let immoralities = find_immoralities(&graph, &sep_sets);
        apply_immoralities(&ctx, &mut graph, &immoralities);
        run.finish(Stage::Immoralities, &graph);

        let mut time_orientations = 0;
        if let Some(pattern) = &time_pattern {
            run.start(Stage::TimeOrientation);
            time_orientations = orient_by_time(&ctx, &mut graph, pattern);
            run.finish(Stage::TimeOrientation, &graph);
        }

        run.start(Stage::Orientation);
        let orientations = orient_edges(&ctx, &mut graph);
        run.finish(Stage::Orientation, &graph);

        let snapshots = run.snapshots;
        Ok(DiscoveryOutput {
            graph,
            sep_sets,
            data,
            missingness_causes,
            potentially_extraneous,
            removed,
            immoralities,
            time_orientations,
            orientations,
            snapshots,
        })
    }
}

impl std::fmt::Debug for Mvpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mvpc")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Stage bookkeeping for one [`Mvpc::discover`] call.
struct Run<'c, 'a> {
    ctx: &'c StageContext<'a>,
    snapshots: Vec<StageSnapshot>,
}

impl Run<'_, '_> {
    fn start(&self, stage: Stage) {
        self.ctx.emit(DiscoveryEvent::StageStarted { stage });
    }

    fn finish(&mut self, stage: Stage, graph: &MarkedGraph) {
        self.ctx.emit(DiscoveryEvent::StageFinished {
            stage,
            edges: graph.edge_count(),
        });
        if self.ctx.config.record_snapshots {
            self.snapshots.push(StageSnapshot {
                stage,
                graph: graph.snapshot(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::oracle::DSeparation;
    use crate::report::CollectingReporter;

    fn collider_table() -> Table {
        let names = ["x", "y", "c"];
        let row: Vec<Option<&str>> = names.iter().map(|_| Some("0")).collect();
        Table::from_rows(&names, &[row]).expect("valid")
    }

    fn collider_oracle() -> DSeparation {
        DSeparation::from_edges(&[("x", "c"), ("y", "c")])
    }

    /// A collider over complete data is fully oriented.
    #[test]
    fn test_discovers_collider() {
        let output = Mvpc::new(collider_oracle(), DiscoveryConfig::default())
            .with_reporter(Arc::new(crate::report::NullReporter))
            .discover(&collider_table())
            .expect("ok");

        assert_eq!(
            output.graph.unmarked_arrows(),
            vec![
                ("x".to_owned(), "c".to_owned()),
                ("y".to_owned(), "c".to_owned())
            ]
        );
        assert!(output.missingness_causes.is_empty());
        assert!(output.potentially_extraneous.is_empty());
        assert_eq!(output.immoralities.len(), 1);
        assert_eq!(output.orientations, 0);
        assert!(output.snapshots.is_empty());
    }

    /// Snapshots follow the stage order; stages that are off are absent.
    #[test]
    fn test_snapshots_per_stage() {
        let config = DiscoveryConfig {
            record_snapshots: true,
            ..DiscoveryConfig::default()
        };
        let output = Mvpc::new(collider_oracle(), config)
            .discover(&collider_table())
            .expect("ok");
        let stages: Vec<Stage> = output.snapshots.iter().map(|s| s.stage).collect();
        assert_eq!(
            stages,
            [
                Stage::Skeleton,
                Stage::MissingnessCauses,
                Stage::ExtraneousEdges,
                Stage::EdgeRemoval,
                Stage::Immoralities,
                Stage::Orientation,
            ]
        );
        assert_eq!(output.snapshots[0].graph.undirected.len(), 2);
        assert!(output.to_json().expect("json").contains("\"stage\": \"orientation\""));
    }

    /// Every stage start has a matching finish.
    #[test]
    fn test_stage_events_balanced() {
        let reporter = Arc::new(CollectingReporter::new());
        Mvpc::new(collider_oracle(), DiscoveryConfig::default())
            .with_reporter(reporter.clone())
            .discover(&collider_table())
            .expect("ok");
        let events = reporter.events();
        let started = events
            .iter()
            .filter(|e| matches!(e, DiscoveryEvent::StageStarted { .. }))
            .count();
        let finished = events
            .iter()
            .filter(|e| matches!(e, DiscoveryEvent::StageFinished { .. }))
            .count();
        assert_eq!(started, 6);
        assert_eq!(started, finished);
    }

    /// Bad configuration is rejected before any test runs.
    #[test]
    fn test_invalid_config_rejected() {
        let config = DiscoveryConfig {
            time_pattern: Some("(".to_owned()),
            ..DiscoveryConfig::default()
        };
        let err = Mvpc::new(collider_oracle(), config)
            .discover(&collider_table())
            .expect_err("invalid");
        assert!(matches!(err, DiscoveryError::InvalidTimePattern { .. }));
    }

    /// Input columns may not use the indicator prefix.
    #[test]
    fn test_prefixed_column_rejected() {
        let table = Table::from_rows(&["MI_a", "b"], &[vec![Some("0"), None]]).expect("valid");
        let err = Mvpc::new(collider_oracle(), DiscoveryConfig::default())
            .discover(&table)
            .expect_err("collision");
        assert!(matches!(err, DiscoveryError::Table(_)));
    }

    /// Time orientation runs when a pattern is configured.
    #[test]
    fn test_time_orientation_stage() {
        let names = ["x_t=1", "x_t=2"];
        let table = Table::from_rows(&names, &[vec![Some("0"), Some("1")]]).expect("valid");
        let oracle = DSeparation::from_edges(&[("x_t=1", "x_t=2")]);
        let config = DiscoveryConfig {
            time_pattern: Some(crate::config::DEFAULT_TIME_PATTERN.to_owned()),
            ..DiscoveryConfig::default()
        };
        let output = Mvpc::new(oracle, config).discover(&table).expect("ok");
        assert_eq!(output.time_orientations, 1);
        assert_eq!(
            output.graph.unmarked_arrows(),
            vec![("x_t=1".to_owned(), "x_t=2".to_owned())]
        );
    }
}
