//! Error types shared by every discovery stage.
//!
//! Three layers, from the inside out:
//!
//! - [`TableError`]: malformed input tables (duplicate or ragged columns,
//!   names colliding with the missingness-indicator scheme).
//! - [`TestError`]: failures raised by an independence oracle.
//! - [`DiscoveryError`]: everything a pipeline stage can return, wrapping the
//!   two above.
//!
//! Degenerate statistical conditions (empty strata, constant columns) are not
//! errors; the components that meet them skip the stratum instead.

/// Errors raised while building or augmenting a [`crate::Table`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// Two columns share the same name.
    #[error("duplicate column name: {0:?}")]
    DuplicateColumn(String),

    /// A row passed to [`crate::Table::from_rows`] has the wrong width.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the header.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },

    /// A pushed column does not match the table's row count.
    #[error("column {column:?} has {found} values, expected {expected}")]
    LengthMismatch {
        /// Name of the offending column.
        column: String,
        /// Current row count of the table.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },

    /// An input column already uses the missingness-indicator prefix.
    #[error("column {column:?} collides with the missingness indicator prefix {prefix:?}")]
    IndicatorCollision {
        /// Name of the offending column.
        column: String,
        /// The configured prefix.
        prefix: String,
    },

    /// A column has more distinct values than level codes can address.
    #[error("column {column:?} has more than {max} distinct values", max = u32::MAX)]
    TooManyLevels {
        /// Name of the offending column.
        column: String,
    },
}

/// Errors raised by an [`crate::IndependenceTest`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestError {
    /// The oracle was asked about a variable that is not a column of the data
    /// (or not a node of its model).
    #[error("unknown column: {0:?}")]
    UnknownColumn(String),

    /// Any other oracle-specific failure.
    #[error("independence test failed: {0}")]
    Failed(String),
}

/// Errors returned by the discovery stages and the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// A conditioning set overlaps the tested variables, or the two tested
    /// variables coincide. Raised before the oracle is consulted.
    #[error("variable {variable:?} appears both as a tested variable and in the conditioning set")]
    OverlappingVariables {
        /// The variable found on both sides.
        variable: String,
    },

    /// A stage referred to a variable that is neither a column nor a node.
    #[error("unknown variable: {0:?}")]
    UnknownVariable(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The time-ordering pattern is not a valid regular expression.
    #[error("invalid time pattern {pattern:?}: {source}")]
    InvalidTimePattern {
        /// The pattern as configured.
        pattern: String,
        /// The regex compiler's diagnostic.
        #[source]
        source: regex::Error,
    },

    /// The input table was rejected.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The independence oracle failed.
    #[error(transparent)]
    Test(#[from] TestError),

    /// A JSON document could not be parsed or produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Display output names the offending values.
    #[test]
    fn test_display_messages_contain_context() {
        let err = TableError::RaggedRow {
            row: 3,
            expected: 2,
            found: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains('5'));

        let err = DiscoveryError::OverlappingVariables {
            variable: "rain".to_owned(),
        };
        assert!(err.to_string().contains("rain"));
    }

    /// Table and oracle errors convert into `DiscoveryError` transparently.
    #[test]
    fn test_from_conversions_preserve_message() {
        let inner = TableError::DuplicateColumn("x".to_owned());
        let outer: DiscoveryError = inner.clone().into();
        assert_eq!(outer.to_string(), inner.to_string());

        let inner = TestError::UnknownColumn("y".to_owned());
        let outer: DiscoveryError = inner.clone().into();
        assert_eq!(outer.to_string(), inner.to_string());
    }
}
