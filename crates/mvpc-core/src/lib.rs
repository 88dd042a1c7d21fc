#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod context;
pub mod correction;
pub mod error;
pub mod extraneous;
pub mod graph;
pub mod immoralities;
pub mod missingness;
pub mod oracle;
pub mod orientation;
pub mod pipeline;
pub mod removal;
pub mod report;
pub mod search;
pub mod sep_sets;
pub mod skeleton;
pub mod table;
pub mod time_orientation;

pub use config::{DEFAULT_MAX_DEPTH, DEFAULT_TIME_PATTERN, DiscoveryConfig, Execution, Expansion};
pub use context::StageContext;
pub use correction::DensityRatioCorrection;
pub use error::{DiscoveryError, TableError, TestError};
pub use extraneous::find_potentially_extraneous_edges;
pub use graph::{
    DirectedPair, EdgeKind, EdgeState, GraphSnapshot, Mark, MarkedGraph, NodeId, Pair,
    edge_distance, structural_hamming_distance,
};
pub use immoralities::{Immorality, apply_immoralities, find_immoralities};
pub use missingness::{MissingnessCause, find_missingness_causes};
pub use oracle::{
    DSeparation, GTest, IndependenceTest, conditional_entropy, conditional_mutual_information,
    entropy,
};
pub use orientation::orient_edges;
pub use pipeline::{DiscoveryOutput, Mvpc, StageSnapshot};
pub use removal::{RemovableEdge, find_removable_edges};
pub use report::{
    CollectingReporter, DiscoveryEvent, NullReporter, Reporter, Stage, TracingReporter,
};
pub use search::{SearchMode, check_disjoint, combinations, find_separating_sets, query};
pub use sep_sets::{SepSet, SepSets};
pub use skeleton::{find_more_separating_sets, find_skeleton};
pub use table::{Column, DEFAULT_INDICATOR_PREFIX, Table, indicator_name, is_indicator};
pub use time_orientation::{orient_by_time, time_index};
