// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Merging the outputs of several controls into one participant input.

use choreo_table::{DataView, TableError};
use hashbrown::HashSet;

/// Failure to merge views.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// There was nothing to merge.
    #[error("no views to merge")]
    Empty,
    /// A view is rooted at a different table than the master view.
    #[error("view {index} is not rooted at the same table as the master view")]
    ForeignTable {
        /// Position of the offending view.
        index: usize,
    },
    /// Narrowing the master view failed.
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Intersects the rows and columns of `views`.
///
/// The first view is the *master*: the result is the master narrowed to the
/// rows and columns whose underlying table indices appear in every view. The
/// master's order and duplicates are preserved. A single view is returned
/// unchanged.
///
/// # Errors
///
/// Returns [`MergeError::Empty`] for an empty slice and
/// [`MergeError::ForeignTable`] if any view is rooted at a different table
/// than the master.
///
/// # Example
///
/// ```
/// use choreo::merge_views;
/// use choreo_table::{ColumnType, DataTable, DataView};
///
/// let mut table = DataTable::new();
/// table.add_column(ColumnType::Number, "x");
/// for i in 0..5 {
///     table.add_row([f64::from(i)]).unwrap();
/// }
/// let base = DataView::from(table);
///
/// let mut a = base.clone();
/// a.set_rows([4, 2, 0]).unwrap();
/// let mut b = base.clone();
/// b.set_rows([1, 2, 3, 4]).unwrap();
///
/// let merged = merge_views(&[a, b]).unwrap();
/// assert_eq!(merged.table_rows(), vec![4, 2]);
/// ```
pub fn merge_views(views: &[DataView]) -> Result<DataView, MergeError> {
    let (master, others) = views.split_first().ok_or(MergeError::Empty)?;
    if others.is_empty() {
        return Ok(master.clone());
    }
    if let Some(pos) = others.iter().position(|v| !v.shares_table_with(master)) {
        return Err(MergeError::ForeignTable { index: pos + 1 });
    }

    let row_sets: Vec<HashSet<usize>> = others
        .iter()
        .map(|v| v.table_rows().into_iter().collect())
        .collect();
    let column_sets: Vec<HashSet<usize>> = others
        .iter()
        .map(|v| v.table_columns().into_iter().collect())
        .collect();

    let rows: Vec<usize> = (0..master.number_of_rows())
        .filter(|&r| {
            master
                .table_row_index(r)
                .is_some_and(|t| row_sets.iter().all(|set| set.contains(&t)))
        })
        .collect();
    let columns: Vec<usize> = (0..master.number_of_columns())
        .filter(|&c| {
            master
                .table_column_index(c)
                .is_some_and(|t| column_sets.iter().all(|set| set.contains(&t)))
        })
        .collect();

    let mut merged = master.clone();
    merged.set_rows(rows)?;
    merged.set_columns(columns)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_table::{ColumnType, DataTable};

    fn grid(rows: u32, columns: usize) -> DataView {
        let mut table = DataTable::new();
        for c in 0..columns {
            table.add_column(ColumnType::Number, format!("c{c}"));
        }
        for r in 0..rows {
            table
                .add_row((0..columns).map(|_| f64::from(r)))
                .unwrap();
        }
        DataView::from(table)
    }

    #[test]
    fn intersects_rows_in_master_order() {
        let base = grid(5, 1);
        let mut a = base.clone();
        a.set_rows([0, 2, 4]).unwrap();
        let mut b = base.clone();
        b.set_rows([1, 2, 3, 4]).unwrap();

        let merged = merge_views(&[a, b]).unwrap();
        assert_eq!(merged.table_rows(), vec![2, 4]);
    }

    #[test]
    fn intersects_columns_and_keeps_duplicates() {
        let base = grid(3, 4);
        let mut master = base.clone();
        master.set_columns([3, 1, 3, 0]).unwrap();
        let mut other = base.clone();
        other.set_columns([0, 3]).unwrap();
        other.set_rows([1]).unwrap();

        let merged = merge_views(&[master, other]).unwrap();
        assert_eq!(merged.table_columns(), vec![3, 3, 0]);
        assert_eq!(merged.table_rows(), vec![1]);
    }

    #[test]
    fn single_view_is_returned_unchanged() {
        let mut only = grid(4, 2);
        only.set_rows([3, 3]).unwrap();
        assert_eq!(merge_views(core::slice::from_ref(&only)).unwrap(), only);
    }

    #[test]
    fn rejects_views_over_other_tables() {
        assert_eq!(
            merge_views(&[grid(2, 1), grid(2, 1)]),
            Err(MergeError::ForeignTable { index: 1 })
        );
        assert_eq!(merge_views(&[]), Err(MergeError::Empty));
    }
}
