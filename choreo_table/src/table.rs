// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned table representation.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::value::{Column, ColumnType, Value};

/// Errors returned when building or indexing tables and views.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableError {
    /// A row index is past the end of the table or view.
    RowOutOfBounds {
        /// The offending index.
        row: usize,
        /// Number of rows available.
        rows: usize,
    },
    /// A column index is past the end of the table or view.
    ColumnOutOfBounds {
        /// The offending index.
        column: usize,
        /// Number of columns available.
        columns: usize,
    },
    /// A row was added with the wrong number of cells.
    ArityMismatch {
        /// Number of columns in the table.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowOutOfBounds { row, rows } => {
                write!(f, "row {row} out of bounds ({rows} rows)")
            }
            Self::ColumnOutOfBounds { column, columns } => {
                write!(f, "column {column} out of bounds ({columns} columns)")
            }
            Self::ArityMismatch { expected, actual } => {
                write!(f, "row has {actual} cells, table has {expected} columns")
            }
        }
    }
}

impl core::error::Error for TableError {}

/// Read access shared by [`DataTable`] and [`DataView`](crate::DataView).
pub trait TabularData {
    /// Returns the number of rows.
    fn number_of_rows(&self) -> usize;

    /// Returns the number of columns.
    fn number_of_columns(&self) -> usize;

    /// Returns the cell at `row`, `column`, if both exist.
    fn value(&self, row: usize, column: usize) -> Option<&Value>;

    /// Returns the metadata of `column`, if it exists.
    fn column(&self, column: usize) -> Option<&Column>;
}

/// An owned, row-major table.
///
/// Rows always have exactly one cell per column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Appends a column and returns its index.
    ///
    /// Existing rows receive [`Value::Null`] in the new column.
    pub fn add_column(&mut self, ty: ColumnType, label: impl Into<String>) -> usize {
        self.columns.push(Column {
            ty,
            label: label.into(),
        });
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len() - 1
    }

    /// Appends a row and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ArityMismatch`] if the row does not have one
    /// cell per column; the table is left unchanged.
    pub fn add_row<I>(&mut self, cells: I) -> Result<usize, TableError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let row: Vec<Value> = cells.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(TableError::ArityMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn number_of_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the table has no columns.
    ///
    /// A table with columns but no rows is not empty: it still describes
    /// something to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the cell at `row`, `column`, if both exist.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)
    }

    /// Replaces the cell at `row`, `column`.
    ///
    /// # Errors
    ///
    /// Returns an out-of-bounds error if either index does not exist.
    pub fn set_value(
        &mut self,
        row: usize,
        column: usize,
        value: impl Into<Value>,
    ) -> Result<(), TableError> {
        let rows = self.rows.len();
        let columns = self.columns.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(TableError::RowOutOfBounds { row, rows })?;
        let cell = cells
            .get_mut(column)
            .ok_or(TableError::ColumnOutOfBounds { column, columns })?;
        *cell = value.into();
        Ok(())
    }

    /// Returns the metadata of `column`, if it exists.
    #[must_use]
    pub fn column(&self, column: usize) -> Option<&Column> {
        self.columns.get(column)
    }

    /// Returns all column metadata.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the index of the first column labelled `label`.
    #[must_use]
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.label == label)
    }
}

impl TabularData for DataTable {
    fn number_of_rows(&self) -> usize {
        Self::number_of_rows(self)
    }

    fn number_of_columns(&self) -> usize {
        Self::number_of_columns(self)
    }

    fn value(&self, row: usize, column: usize) -> Option<&Value> {
        Self::value(self, row, column)
    }

    fn column(&self, column: usize) -> Option<&Column> {
        Self::column(self, column)
    }
}
