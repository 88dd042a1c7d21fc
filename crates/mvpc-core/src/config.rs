//! Discovery configuration.
//!
//! [`DiscoveryConfig`] is plain data with serde support, so it can be built in
//! code or loaded from a JSON document. Every field has a default; unknown
//! fields are rejected so that typos surface instead of silently falling back.
//!
//! ```
//! use mvpc_core::{DiscoveryConfig, Execution};
//!
//! let config = DiscoveryConfig::from_json_str(r#"{"max_depth": 2, "execution": "parallel"}"#)
//!     .unwrap_or_default();
//! assert_eq!(config.max_depth, 2);
//! assert_eq!(config.execution, Execution::Parallel);
//! assert_eq!(config.indicator_prefix, "MI_");
//! ```
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;
use crate::oracle::information::DEFAULT_SIGNIFICANCE;
use crate::table::DEFAULT_INDICATOR_PREFIX;

/// Default bound on conditioning-set size.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Time-index pattern matching names such as `rain_t=3`.
pub const DEFAULT_TIME_PATTERN: &str = "_t=[0-9]+";

/// How the per-pair tests of one skeleton depth round are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// On the calling thread.
    #[default]
    Sequential,
    /// On the rayon global pool.
    Parallel,
}

/// How fractional weighted counts become whole rows in a corrected table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expansion {
    /// Drop the fractional part.
    #[default]
    Truncate,
    /// Round half away from zero.
    Round,
}

impl Expansion {
    /// Number of rows emitted for a weighted count.
    pub fn rows_for(self, count: f64) -> usize {
        let rows = match self {
            Expansion::Truncate => count.trunc(),
            Expansion::Round => count.round(),
        };
        if rows.is_finite() && rows > 0.0 {
            rows as usize
        } else {
            0
        }
    }
}

/// Settings for one [`crate::Mvpc`] run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Largest conditioning set tried by the skeleton search, the
    /// missingness-cause search and edge-removal validation.
    pub max_depth: usize,
    /// Prefix of missingness-indicator column names.
    pub indicator_prefix: String,
    /// Sequential or parallel skeleton rounds.
    pub execution: Execution,
    /// Run the exhaustive second pass over non-adjacent pairs after the
    /// skeleton search.
    pub find_more_separating_sets: bool,
    /// Rounding used when expanding corrected counts into rows.
    pub expansion: Expansion,
    /// Regex locating the time index in node names. Time-based orientation
    /// runs only when set.
    pub time_pattern: Option<String>,
    /// Capture a graph snapshot after every stage.
    pub record_snapshots: bool,
    /// Significance level of the built-in G test.
    pub significance: f64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            indicator_prefix: DEFAULT_INDICATOR_PREFIX.to_owned(),
            execution: Execution::default(),
            find_more_separating_sets: false,
            expansion: Expansion::default(),
            time_pattern: None,
            record_snapshots: false,
            significance: DEFAULT_SIGNIFICANCE,
        }
    }
}

impl DiscoveryConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Json`] for malformed documents or unknown
    /// fields, and the errors of [`DiscoveryConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, DiscoveryError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::InvalidConfig`] for an empty indicator prefix or a
    ///   significance level outside `(0, 1)`.
    /// - [`DiscoveryError::InvalidTimePattern`] if `time_pattern` does not
    ///   compile.
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.indicator_prefix.is_empty() {
            return Err(DiscoveryError::InvalidConfig(
                "indicator_prefix must not be empty".to_owned(),
            ));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(DiscoveryError::InvalidConfig(format!(
                "significance must lie in (0, 1), got {}",
                self.significance
            )));
        }
        self.time_regex()?;
        Ok(())
    }

    /// Compiles `time_pattern`, if set.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidTimePattern`] if it does not compile.
    pub fn time_regex(&self) -> Result<Option<Regex>, DiscoveryError> {
        self.time_pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| DiscoveryError::InvalidTimePattern {
                    pattern: pattern.to_owned(),
                    source,
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    /// An empty document yields the defaults.
    #[test]
    fn test_empty_document_is_default() {
        let config = DiscoveryConfig::from_json_str("{}").expect("valid");
        assert_eq!(config, DiscoveryConfig::default());
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.expansion, Expansion::Truncate);
    }

    /// Every field can be set from JSON.
    #[test]
    fn test_all_fields_parse() {
        let config = DiscoveryConfig::from_json_str(
            r#"{
                "max_depth": 3,
                "indicator_prefix": "R_",
                "execution": "parallel",
                "find_more_separating_sets": true,
                "expansion": "round",
                "time_pattern": "_t=[0-9]+",
                "record_snapshots": true,
                "significance": 0.01
            }"#,
        )
        .expect("valid");
        assert_eq!(config.indicator_prefix, "R_");
        assert_eq!(config.execution, Execution::Parallel);
        assert!(config.find_more_separating_sets);
        assert_eq!(config.expansion, Expansion::Round);
        assert!(config.time_regex().expect("compiles").is_some());
    }

    /// Unknown fields are rejected.
    #[test]
    fn test_unknown_field_rejected() {
        let err = DiscoveryConfig::from_json_str(r#"{"max_dept": 3}"#).expect_err("typo");
        assert!(matches!(err, DiscoveryError::Json(_)));
    }

    /// Out-of-range values are rejected by validation.
    #[test]
    fn test_validation() {
        let mut config = DiscoveryConfig {
            significance: 1.5,
            ..DiscoveryConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DiscoveryError::InvalidConfig(_))
        ));

        config.significance = 0.05;
        config.indicator_prefix.clear();
        assert!(config.validate().is_err());

        config.indicator_prefix = "MI_".to_owned();
        config.time_pattern = Some("(".to_owned());
        assert!(matches!(
            config.validate(),
            Err(DiscoveryError::InvalidTimePattern { .. })
        ));
    }

    /// Truncation and rounding differ on fractional counts.
    #[test]
    fn test_expansion_rows() {
        assert_eq!(Expansion::Truncate.rows_for(2.7), 2);
        assert_eq!(Expansion::Round.rows_for(2.7), 3);
        assert_eq!(Expansion::Round.rows_for(2.4), 2);
        assert_eq!(Expansion::Truncate.rows_for(-1.0), 0);
        assert_eq!(Expansion::Round.rows_for(f64::NAN), 0);
    }
}
