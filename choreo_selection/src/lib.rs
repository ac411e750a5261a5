// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Choreo Selection: selection bookkeeping for dashboards.
//!
//! A dashboard shows one data table through several participants (charts,
//! tables, controls). Each participant keeps its own selection of rows,
//! columns or cells, and the dashboard exposes the union of all of them.
//!
//! This crate provides:
//! - [`SelectionItem`], a selected row, column or cell of the shared table.
//! - [`Selection`], an ordered set of unique keys with a revision counter that
//!   bumps only when the contents change.
//! - [`SelectionUnion`], the dashboard-level union. Every item in the union is
//!   reference-counted by the participants that select it: the item leaves the
//!   union only when its last owner deselects it.
//!
//! ## Minimal example
//!
//! ```rust
//! use choreo_selection::{SelectionItem, SelectionUnion};
//!
//! let mut union = SelectionUnion::<&str>::new();
//!
//! union.add("chart", SelectionItem::Row(3));
//! union.add("table", SelectionItem::Row(3));
//! assert_eq!(union.selection().items(), &[SelectionItem::Row(3)]);
//!
//! // The table still selects row 3.
//! union.remove(&"chart", &SelectionItem::Row(3));
//! assert!(union.contains(&SelectionItem::Row(3)));
//!
//! union.remove(&"table", &SelectionItem::Row(3));
//! assert!(union.is_empty());
//! ```
//!
//! Participants usually report their whole selection at once. Use
//! [`SelectionUnion::set_participant_selection`] to apply the difference
//! against what that participant reported before.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod item;
mod selection;
mod union;

pub use item::SelectionItem;
pub use selection::Selection;
pub use union::SelectionUnion;
