// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `choreo_selection` crate.
//!
//! These exercise `Selection<T>` ordering and revisions, and the reference
//! counting of `SelectionUnion` across several participants.

use choreo_selection::{Selection, SelectionItem, SelectionUnion};

#[test]
fn empty_selection_basics() {
    let sel = Selection::<u32>::new();
    assert!(sel.is_empty());
    assert_eq!(sel.len(), 0);
    assert_eq!(sel.revision(), 0);
}

#[test]
fn replace_with_dedups_and_bumps_only_on_change() {
    let mut sel = Selection::new();
    sel.replace_with([3, 1, 3, 2]);
    assert_eq!(sel.items(), &[3, 1, 2]);
    assert_eq!(sel.revision(), 1);

    sel.replace_with([3, 1, 2, 1]);
    assert_eq!(sel.revision(), 1);

    sel.replace_with([1, 2, 3]);
    assert_eq!(sel.revision(), 2);
}

#[test]
fn union_over_selection_items_starts_empty() {
    let mut union: SelectionUnion<u32> = SelectionUnion::default();
    assert!(union.is_empty());
    assert!(union.add(7, SelectionItem::Column(3)));
    assert_eq!(
        union.participant_selection(&7).map(Selection::items),
        Some(&[SelectionItem::Column(3)][..])
    );
}

#[test]
fn clear_bumps_only_when_non_empty() {
    let mut sel = Selection::<u32>::new();
    sel.clear();
    assert_eq!(sel.revision(), 0);

    sel.add(1);
    sel.clear();
    assert!(sel.is_empty());
    assert_eq!(sel.revision(), 2);
}

#[test]
fn union_reference_counts_items_across_participants() {
    let row = SelectionItem::Row(2);
    let cell = SelectionItem::Cell { row: 0, column: 1 };
    let mut union = SelectionUnion::<&str>::new();

    assert!(union.add("pie", row));
    assert!(!union.add("bars", row));
    assert!(union.add("bars", cell));
    assert_eq!(union.selection().items(), &[row, cell]);

    assert!(!union.remove(&"pie", &row));
    assert!(union.contains(&row));
    assert_eq!(union.owners(&row), &["bars"]);

    assert!(union.remove(&"bars", &row));
    assert!(!union.contains(&row));
    assert_eq!(union.selection().items(), &[cell]);
}

#[test]
fn set_participant_selection_applies_the_difference() {
    let mut union = SelectionUnion::<u32>::new();
    union.add(1, SelectionItem::Row(0));

    assert!(union.set_participant_selection(
        2,
        [SelectionItem::Row(0), SelectionItem::Row(1)]
    ));
    let rev = union.revision();

    // Same selection again: nothing to do.
    assert!(!union.set_participant_selection(
        2,
        [SelectionItem::Row(1), SelectionItem::Row(0)]
    ));
    assert_eq!(union.revision(), rev);

    // Dropping row 0 from participant 2 keeps it in the union for 1.
    assert!(!union.set_participant_selection(2, [SelectionItem::Row(1)]));
    assert_eq!(union.owners(&SelectionItem::Row(0)), &[1]);

    assert!(union.set_participant_selection(2, []));
    assert_eq!(union.selection().items(), &[SelectionItem::Row(0)]);
}

#[test]
fn remove_participant_releases_only_its_items() {
    let mut union = SelectionUnion::<u32>::new();
    union.set_participant_selection(1, [SelectionItem::Column(0), SelectionItem::Column(1)]);
    union.set_participant_selection(2, [SelectionItem::Column(1)]);

    assert!(union.remove_participant(&1));
    assert_eq!(union.selection().items(), &[SelectionItem::Column(1)]);
    assert!(union.participant_selection(&1).is_none());

    assert!(!union.remove_participant(&1));
}
