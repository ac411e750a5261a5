// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Choreo Table: tabular data shared between dashboard participants.
//!
//! This crate provides:
//! - [`DataTable`], an owned row-major table of [`Value`] cells with typed
//!   [`Column`] metadata, and
//! - [`DataView`], a cheap row/column selection over exactly one shared table.
//!
//! Views never copy cells. A view stores table-relative row and column index
//! lists; building a view from another view composes those lists, so every
//! view, however it was derived, can translate its indices back to the one
//! table it is rooted at. Index lists may repeat entries, which lets a view
//! duplicate rows or columns of its table.
//!
//! ```rust
//! use choreo_table::{ColumnType, DataTable, DataView, Value};
//!
//! let mut table = DataTable::new();
//! table.add_column(ColumnType::String, "name");
//! table.add_column(ColumnType::Number, "age");
//! table.add_row([Value::from("Ada"), Value::from(36.0)]).unwrap();
//! table.add_row([Value::from("Linus"), Value::from(28.0)]).unwrap();
//! table.add_row([Value::from("Grace"), Value::from(85.0)]).unwrap();
//!
//! let mut view = DataView::from(table);
//! view.set_rows([2, 0]).unwrap();
//! view.set_columns([0]).unwrap();
//!
//! assert_eq!(view.number_of_rows(), 2);
//! assert_eq!(view.value(0, 0), Some(&Value::from("Grace")));
//! assert_eq!(view.table_row_index(1), Some(0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod table;
mod value;
mod view;

pub use table::{DataTable, TableError, TabularData};
pub use value::{Column, ColumnType, Value};
pub use view::DataView;
