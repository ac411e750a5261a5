// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row/column views over a shared table.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::table::{DataTable, TableError, TabularData};
use crate::value::{Column, Value};

/// A row and column selection over one shared [`DataTable`].
///
/// Indices passed to a view's methods are *view-relative*; the view
/// translates them to *table-relative* indices with
/// [`table_row_index`](Self::table_row_index) and
/// [`table_column_index`](Self::table_column_index).
///
/// Cloning a view is cheap with respect to cell data: the table is shared.
/// A clone is a new layer over the same table and can be narrowed
/// independently.
#[derive(Clone, PartialEq)]
pub struct DataView {
    table: Rc<DataTable>,
    /// Table-relative row indices, `None` for "all rows in table order".
    rows: Option<Vec<usize>>,
    /// Table-relative column indices, `None` for "all columns in table order".
    columns: Option<Vec<usize>>,
}

impl fmt::Debug for DataView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataView")
            .field("table", &Rc::as_ptr(&self.table))
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .finish()
    }
}

impl From<DataTable> for DataView {
    fn from(table: DataTable) -> Self {
        Self::new(Rc::new(table))
    }
}

impl From<Rc<DataTable>> for DataView {
    fn from(table: Rc<DataTable>) -> Self {
        Self::new(table)
    }
}

impl DataView {
    /// Creates a view showing every row and column of `table`.
    #[must_use]
    pub fn new(table: Rc<DataTable>) -> Self {
        Self {
            table,
            rows: None,
            columns: None,
        }
    }

    /// Returns the table this view is rooted at.
    #[must_use]
    pub fn table(&self) -> &Rc<DataTable> {
        &self.table
    }

    /// Returns `true` if `other` is rooted at the same table allocation.
    #[must_use]
    pub fn shares_table_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.table, &other.table)
    }

    /// Returns the number of visible rows.
    #[must_use]
    pub fn number_of_rows(&self) -> usize {
        self.rows
            .as_ref()
            .map_or(self.table.number_of_rows(), Vec::len)
    }

    /// Returns the number of visible columns.
    #[must_use]
    pub fn number_of_columns(&self) -> usize {
        self.columns
            .as_ref()
            .map_or(self.table.number_of_columns(), Vec::len)
    }

    /// Translates a view row to its row in the underlying table.
    #[must_use]
    pub fn table_row_index(&self, view_row: usize) -> Option<usize> {
        match &self.rows {
            Some(rows) => rows.get(view_row).copied(),
            None => (view_row < self.table.number_of_rows()).then_some(view_row),
        }
    }

    /// Translates a view column to its column in the underlying table.
    #[must_use]
    pub fn table_column_index(&self, view_column: usize) -> Option<usize> {
        match &self.columns {
            Some(columns) => columns.get(view_column).copied(),
            None => (view_column < self.table.number_of_columns()).then_some(view_column),
        }
    }

    /// Returns every view row showing `table_row`, in view order.
    ///
    /// Empty if the table row is hidden; more than one entry if the view
    /// duplicates it.
    #[must_use]
    pub fn view_rows_for_table_row(&self, table_row: usize) -> Vec<usize> {
        (0..self.number_of_rows())
            .filter(|&r| self.table_row_index(r) == Some(table_row))
            .collect()
    }

    /// Returns every view column showing `table_column`, in view order.
    #[must_use]
    pub fn view_columns_for_table_column(&self, table_column: usize) -> Vec<usize> {
        (0..self.number_of_columns())
            .filter(|&c| self.table_column_index(c) == Some(table_column))
            .collect()
    }

    /// Returns the table-relative indices of all visible rows, in view order.
    #[must_use]
    pub fn table_rows(&self) -> Vec<usize> {
        match &self.rows {
            Some(rows) => rows.clone(),
            None => (0..self.table.number_of_rows()).collect(),
        }
    }

    /// Returns the table-relative indices of all visible columns, in view order.
    #[must_use]
    pub fn table_columns(&self) -> Vec<usize> {
        match &self.columns {
            Some(columns) => columns.clone(),
            None => (0..self.table.number_of_columns()).collect(),
        }
    }

    /// Narrows the view to the given view rows, in the given order.
    ///
    /// Indices are relative to the view *before* the call and may repeat.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowOutOfBounds`] if any index is not a visible
    /// row; the view is left unchanged.
    pub fn set_rows(&mut self, rows: impl IntoIterator<Item = usize>) -> Result<(), TableError> {
        let available = self.number_of_rows();
        let mapped = rows
            .into_iter()
            .map(|row| {
                self.table_row_index(row)
                    .ok_or(TableError::RowOutOfBounds {
                        row,
                        rows: available,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.rows = Some(mapped);
        Ok(())
    }

    /// Narrows the view to the given view columns, in the given order.
    ///
    /// Indices are relative to the view *before* the call and may repeat.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ColumnOutOfBounds`] if any index is not a
    /// visible column; the view is left unchanged.
    pub fn set_columns(
        &mut self,
        columns: impl IntoIterator<Item = usize>,
    ) -> Result<(), TableError> {
        let available = self.number_of_columns();
        let mapped = columns
            .into_iter()
            .map(|column| {
                self.table_column_index(column)
                    .ok_or(TableError::ColumnOutOfBounds {
                        column,
                        columns: available,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.columns = Some(mapped);
        Ok(())
    }

    /// Hides the given view rows. Out-of-range indices are ignored.
    pub fn hide_rows(&mut self, hidden: &[usize]) {
        let kept: Vec<usize> = (0..self.number_of_rows())
            .filter(|r| !hidden.contains(r))
            .filter_map(|r| self.table_row_index(r))
            .collect();
        self.rows = Some(kept);
    }

    /// Hides the given view columns. Out-of-range indices are ignored.
    pub fn hide_columns(&mut self, hidden: &[usize]) {
        let kept: Vec<usize> = (0..self.number_of_columns())
            .filter(|c| !hidden.contains(c))
            .filter_map(|c| self.table_column_index(c))
            .collect();
        self.columns = Some(kept);
    }

    /// Keeps only the view rows for which `keep` returns `true`.
    ///
    /// The predicate receives the view and a view row index.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&Self, usize) -> bool) {
        let kept: Vec<usize> = (0..self.number_of_rows())
            .filter(|&r| keep(self, r))
            .filter_map(|r| self.table_row_index(r))
            .collect();
        self.rows = Some(kept);
    }

    /// Returns the cell at view `row`, view `column`, if both exist.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.table
            .value(self.table_row_index(row)?, self.table_column_index(column)?)
    }

    /// Returns the metadata of view `column`, if it exists.
    #[must_use]
    pub fn column(&self, column: usize) -> Option<&Column> {
        self.table.column(self.table_column_index(column)?)
    }

    /// Copies the visible cells into a new, independent table.
    #[must_use]
    pub fn to_table(&self) -> DataTable {
        let mut out = DataTable::new();
        let columns = self.table_columns();
        for &c in &columns {
            if let Some(column) = self.table.column(c) {
                out.add_column(column.ty, column.label.clone());
            }
        }
        for r in self.table_rows() {
            let cells: Vec<Value> = columns
                .iter()
                .map(|&c| self.table.value(r, c).cloned().unwrap_or_default())
                .collect();
            // Every cell list has exactly one entry per copied column.
            let _ = out.add_row(cells);
        }
        out
    }
}

impl TabularData for DataView {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ColumnType;
    use alloc::vec;

    fn numbers(rows: usize) -> Rc<DataTable> {
        let mut table = DataTable::new();
        table.add_column(ColumnType::Number, "n");
        table.add_column(ColumnType::Number, "square");
        for i in 0..rows {
            let n = f64::from(u32::try_from(i).unwrap());
            table.add_row([n, n * n]).unwrap();
        }
        Rc::new(table)
    }

    #[test]
    fn unrestricted_view_mirrors_table() {
        let view = DataView::new(numbers(3));
        assert_eq!(view.number_of_rows(), 3);
        assert_eq!(view.number_of_columns(), 2);
        assert_eq!(view.table_row_index(2), Some(2));
        assert_eq!(view.table_row_index(3), None);
    }

    #[test]
    fn set_rows_composes_through_layers() {
        let mut view = DataView::new(numbers(6));
        view.set_rows([1, 3, 5]).unwrap();

        let mut layered = view.clone();
        layered.set_rows([2, 0]).unwrap();

        assert_eq!(layered.table_rows(), vec![5, 1]);
        assert_eq!(layered.value(0, 1), Some(&Value::Number(25.0)));
        // The lower layer is unaffected.
        assert_eq!(view.table_rows(), vec![1, 3, 5]);
        assert!(layered.shares_table_with(&view));
    }

    #[test]
    fn set_rows_rejects_hidden_indices() {
        let mut view = DataView::new(numbers(4));
        view.set_rows([0, 1]).unwrap();

        assert_eq!(
            view.set_rows([1, 2]),
            Err(TableError::RowOutOfBounds { row: 2, rows: 2 })
        );
        assert_eq!(view.table_rows(), vec![0, 1]);
    }

    #[test]
    fn duplicates_are_preserved() {
        let mut view = DataView::new(numbers(3));
        view.set_rows([2, 2, 0]).unwrap();

        assert_eq!(view.number_of_rows(), 3);
        assert_eq!(view.view_rows_for_table_row(2), vec![0, 1]);
        assert!(view.view_rows_for_table_row(1).is_empty());
    }

    #[test]
    fn hide_and_retain() {
        let mut view = DataView::new(numbers(5));
        view.hide_rows(&[0, 4]);
        assert_eq!(view.table_rows(), vec![1, 2, 3]);

        view.retain_rows(|v, r| v.value(r, 0).and_then(Value::as_f64) != Some(2.0));
        assert_eq!(view.table_rows(), vec![1, 3]);

        view.hide_columns(&[0]);
        assert_eq!(view.table_columns(), vec![1]);
        assert_eq!(view.column(0).map(|c| c.label.as_str()), Some("square"));
    }

    #[test]
    fn to_table_materialises_visible_cells() {
        let mut view = DataView::new(numbers(4));
        view.set_rows([3, 1]).unwrap();
        view.set_columns([1]).unwrap();

        let table = view.to_table();
        assert_eq!(table.number_of_rows(), 2);
        assert_eq!(table.number_of_columns(), 1);
        assert_eq!(table.value(0, 0), Some(&Value::Number(9.0)));
        assert_eq!(table.value(1, 0), Some(&Value::Number(1.0)));
    }
}
