//! Shared inputs of every discovery stage.
use crate::config::DiscoveryConfig;
use crate::oracle::IndependenceTest;
use crate::report::{DiscoveryEvent, NullReporter, Reporter};

/// Borrowed oracle, configuration and reporter handed to each stage.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    /// The independence oracle.
    pub oracle: &'a dyn IndependenceTest,
    /// Run configuration.
    pub config: &'a DiscoveryConfig,
    /// Event sink.
    pub reporter: &'a dyn Reporter,
}

impl<'a> StageContext<'a> {
    /// Bundles an oracle and a configuration with [`NullReporter`].
    pub fn new(oracle: &'a dyn IndependenceTest, config: &'a DiscoveryConfig) -> Self {
        Self {
            oracle,
            config,
            reporter: &NullReporter,
        }
    }

    /// Replaces the reporter.
    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub(crate) fn emit(&self, event: DiscoveryEvent) {
        self.reporter.on_event(&event);
    }
}

impl std::fmt::Debug for StageContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
