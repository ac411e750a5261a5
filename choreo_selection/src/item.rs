// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// A selectable part of a table, in table-relative indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectionItem {
    /// A whole row.
    Row(usize),
    /// A whole column.
    Column(usize),
    /// A single cell.
    Cell {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
    },
}

impl SelectionItem {
    /// Returns the row this item touches, if it is a row or a cell.
    #[must_use]
    pub fn row(&self) -> Option<usize> {
        match *self {
            Self::Row(row) | Self::Cell { row, .. } => Some(row),
            Self::Column(_) => None,
        }
    }

    /// Returns the column this item touches, if it is a column or a cell.
    #[must_use]
    pub fn column(&self) -> Option<usize> {
        match *self {
            Self::Column(column) | Self::Cell { column, .. } => Some(column),
            Self::Row(_) => None,
        }
    }
}

impl fmt::Display for SelectionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(row) => write!(f, "row {row}"),
            Self::Column(column) => write!(f, "column {column}"),
            Self::Cell { row, column } => write!(f, "cell ({row}, {column})"),
        }
    }
}
