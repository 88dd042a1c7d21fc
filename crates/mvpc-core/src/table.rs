//! Column-major categorical table with explicit missing cells.
//!
//! Every column interns its values into a level dictionary and stores one
//! `Option<u32>` code per row, `None` being the "absent" marker. Codes index
//! into [`Column::levels`]; they are stable for the lifetime of the column, so
//! derived tables (such as the output of
//! [`crate::correction::DensityRatioCorrection`]) can share dictionaries with
//! their source.
//!
//! Missingness indicators are ordinary Boolean columns named
//! `prefix + source` whose levels are `false` and `true` (`true` = missing).
//! [`Table::with_missingness_indicators`] appends one for every column that has
//! at least one absent cell.
use std::collections::HashMap;

use crate::error::TableError;

/// Prefix used for missingness-indicator columns unless configured otherwise.
pub const DEFAULT_INDICATOR_PREFIX: &str = "MI_";

/// Level dictionary shared by every indicator column.
const INDICATOR_LEVELS: [&str; 2] = ["false", "true"];

/// Code of the level interned at `index`, if it fits in a `u32`.
fn level_code(index: usize) -> Option<u32> {
    u32::try_from(index).ok()
}

/// Returns the indicator column name for `column` under `prefix`.
pub fn indicator_name(prefix: &str, column: &str) -> String {
    format!("{prefix}{column}")
}

/// Returns `true` if `name` follows the indicator naming scheme.
pub fn is_indicator(prefix: &str, name: &str) -> bool {
    name.starts_with(prefix)
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// A single categorical variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    levels: Vec<String>,
    codes: Vec<Option<u32>>,
}

impl Column {
    /// Builds a column by interning `values` in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::TooManyLevels`] if the distinct values outnumber
    /// the `u32` code space.
    pub fn from_values<I, S>(name: impl Into<String>, values: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let name = name.into();
        let mut levels: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, u32> = HashMap::new();
        let mut codes = Vec::new();

        for value in values {
            let Some(value) = value else {
                codes.push(None);
                continue;
            };
            let value = value.as_ref();
            let code = match lookup.get(value) {
                Some(&code) => code,
                None => {
                    let code = level_code(levels.len()).ok_or_else(|| {
                        TableError::TooManyLevels {
                            column: name.clone(),
                        }
                    })?;
                    levels.push(value.to_owned());
                    lookup.insert(value.to_owned(), code);
                    code
                }
            };
            codes.push(Some(code));
        }

        Ok(Self {
            name,
            levels,
            codes,
        })
    }

    /// Builds a column from pre-interned codes. Every `Some` code must index
    /// into `levels`.
    pub(crate) fn from_codes(name: String, levels: Vec<String>, codes: Vec<Option<u32>>) -> Self {
        debug_assert!(
            codes
                .iter()
                .flatten()
                .all(|&c| (c as usize) < levels.len())
        );
        Self {
            name,
            levels,
            codes,
        }
    }

    /// Builds the Boolean missingness indicator of `source`.
    fn indicator_of(source: &Column, prefix: &str) -> Self {
        let codes = source
            .codes
            .iter()
            .map(|c| Some(u32::from(c.is_none())))
            .collect();
        Self {
            name: indicator_name(prefix, &source.name),
            levels: INDICATOR_LEVELS.iter().map(|&l| l.to_owned()).collect(),
            codes,
        }
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Interned code of `row`, or `None` if the cell is absent or out of range.
    pub fn code(&self, row: usize) -> Option<u32> {
        self.codes.get(row).copied().flatten()
    }

    /// Value of `row`, or `None` if the cell is absent or out of range.
    pub fn value(&self, row: usize) -> Option<&str> {
        self.code(row)
            .and_then(|c| self.levels.get(c as usize))
            .map(String::as_str)
    }

    /// The level dictionary, indexed by code.
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// All codes, one per row.
    pub fn codes(&self) -> &[Option<u32>] {
        &self.codes
    }

    /// Number of distinct observed values.
    pub fn cardinality(&self) -> usize {
        self.levels.len()
    }

    /// Number of absent cells.
    pub fn missing_count(&self) -> usize {
        self.codes.iter().filter(|c| c.is_none()).count()
    }

    /// Returns `true` if at least one cell is absent.
    pub fn has_missing(&self) -> bool {
        self.codes.iter().any(Option::is_none)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An ordered collection of equally long [`Column`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: usize,
}

impl Table {
    /// Creates a table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from a header and row-major cells (`None` = missing).
    ///
    /// # Errors
    ///
    /// - [`TableError::DuplicateColumn`] if the header repeats a name.
    /// - [`TableError::RaggedRow`] if a row's width differs from the header.
    /// - [`TableError::TooManyLevels`] if a column has more distinct values
    ///   than `u32` codes.
    pub fn from_rows<H, S>(header: &[H], rows: &[Vec<Option<S>>]) -> Result<Self, TableError>
    where
        H: AsRef<str>,
        S: AsRef<str>,
    {
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != header.len() {
                return Err(TableError::RaggedRow {
                    row,
                    expected: header.len(),
                    found: cells.len(),
                });
            }
        }

        let mut table = Self::new();
        for (col, name) in header.iter().enumerate() {
            let values = rows.iter().map(|cells| cells[col].as_ref().map(AsRef::as_ref));
            table.push_column(Column::from_values(name.as_ref(), values)?)?;
        }
        table.rows = rows.len();
        Ok(table)
    }

    /// Appends a column.
    ///
    /// The first column of an empty table fixes the row count.
    ///
    /// # Errors
    ///
    /// - [`TableError::DuplicateColumn`] if a column with that name exists.
    /// - [`TableError::LengthMismatch`] if the column length differs from the
    ///   table's row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.index.contains_key(column.name()) {
            return Err(TableError::DuplicateColumn(column.name().to_owned()));
        }
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(TableError::LengthMismatch {
                column: column.name().to_owned(),
                expected: self.rows,
                found: column.len(),
            });
        }
        self.index.insert(column.name().to_owned(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// All columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Returns `true` if a column with that name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns `true` if any cell of any column is absent.
    pub fn has_missing(&self) -> bool {
        self.columns.iter().any(Column::has_missing)
    }

    /// Names of the columns with at least one absent cell.
    pub fn columns_with_missing(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.has_missing())
            .map(Column::name)
            .collect()
    }

    /// Names of the columns that are not missingness indicators under `prefix`.
    pub fn substantive_columns(&self, prefix: &str) -> Vec<&str> {
        self.columns
            .iter()
            .map(Column::name)
            .filter(|name| !is_indicator(prefix, name))
            .collect()
    }

    /// Returns a copy of this table with one indicator column appended per
    /// column that has at least one absent cell.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::IndicatorCollision`] if an existing column name
    /// already starts with `prefix`.
    pub fn with_missingness_indicators(&self, prefix: &str) -> Result<Self, TableError> {
        if let Some(column) = self.columns.iter().find(|c| is_indicator(prefix, c.name())) {
            return Err(TableError::IndicatorCollision {
                column: column.name().to_owned(),
                prefix: prefix.to_owned(),
            });
        }

        let mut augmented = self.clone();
        for column in self.columns.iter().filter(|c| c.has_missing()) {
            augmented.push_column(Column::indicator_of(column, prefix))?;
        }
        Ok(augmented)
    }

    /// Indices of rows observed on every column in `vars` (test-wise deletion),
    /// or `None` if any name is unknown.
    pub fn complete_rows(&self, vars: &[&str]) -> Option<Vec<usize>> {
        let columns = self.resolve(vars).ok()?;
        Some(complete_rows(&columns, self.row_count()))
    }

    /// Resolves `names` to columns, returning the first unknown name on failure.
    pub(crate) fn resolve<'t>(&'t self, names: &[&str]) -> Result<Vec<&'t Column>, String> {
        names
            .iter()
            .map(|&name| self.column(name).ok_or_else(|| name.to_owned()))
            .collect()
    }
}

/// Indices of the rows in which every one of `columns` is observed.
pub(crate) fn complete_rows(columns: &[&Column], rows: usize) -> Vec<usize> {
    (0..rows)
        .filter(|&row| columns.iter().all(|c| c.code(row).is_some()))
        .collect()
}

/// The codes of `columns` at `row`, or `None` if any of them is absent.
pub(crate) fn row_key(columns: &[&Column], row: usize) -> Option<Vec<u32>> {
    columns.iter().map(|c| c.code(row)).collect()
}
