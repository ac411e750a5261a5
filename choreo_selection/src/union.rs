// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::item::SelectionItem;
use crate::selection::Selection;

/// Owners of one selected item. Most items are selected by one or two
/// participants.
type Owners<P> = SmallVec<[P; 2]>;

/// Union of the selections of several participants.
///
/// Every item in the union remembers which participants select it. An item
/// enters the union when its first owner adds it and leaves when its last
/// owner removes it.
///
/// `P` identifies a participant; `T` is the selected key, a
/// [`SelectionItem`] by default.
pub struct SelectionUnion<P, T = SelectionItem> {
    selection: Selection<T>,
    owners: HashMap<T, Owners<P>>,
    by_participant: HashMap<P, Selection<T>>,
}

impl<P, T> Default for SelectionUnion<P, T> {
    fn default() -> Self {
        Self {
            selection: Selection::new(),
            owners: HashMap::new(),
            by_participant: HashMap::new(),
        }
    }
}

impl<P: fmt::Debug, T: fmt::Debug> fmt::Debug for SelectionUnion<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionUnion")
            .field("selection", &self.selection)
            .field("owners", &self.owners)
            .finish_non_exhaustive()
    }
}

impl<P, T> SelectionUnion<P, T> {
    /// Creates an empty union.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no participant selects anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Returns the number of distinct selected items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selection.len()
    }

    /// Returns the union, ordered by when each item first entered it.
    #[must_use]
    pub fn selection(&self) -> &Selection<T> {
        &self.selection
    }

    /// Returns the revision of the union.
    ///
    /// Bumps only when an item enters or leaves the union, not when an
    /// already-selected item gains or loses one of several owners.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.selection.revision()
    }

    /// Removes every item and every participant.
    pub fn clear(&mut self) {
        self.selection.clear();
        self.owners.clear();
        self.by_participant.clear();
    }
}

impl<P, T> SelectionUnion<P, T>
where
    P: Hash + Eq + Clone,
    T: Hash + Eq + Clone,
{
    /// Returns `true` if at least one participant selects `item`.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.owners.contains_key(item)
    }

    /// Returns the participants selecting `item`.
    #[must_use]
    pub fn owners(&self, item: &T) -> &[P] {
        self.owners.get(item).map(|o| o.as_slice()).unwrap_or(&[])
    }

    /// Returns what `participant` currently selects, if anything.
    #[must_use]
    pub fn participant_selection(&self, participant: &P) -> Option<&Selection<T>> {
        self.by_participant.get(participant)
    }

    /// Records that `participant` selects `item`.
    ///
    /// Returns `true` if `item` entered the union.
    pub fn add(&mut self, participant: P, item: T) -> bool {
        let own = self.by_participant.entry(participant.clone()).or_default();
        if !own.add(item.clone()) {
            return false;
        }
        let owners = self.owners.entry(item.clone()).or_default();
        owners.push(participant);
        if owners.len() == 1 {
            self.selection.add(item)
        } else {
            false
        }
    }

    /// Records that `participant` no longer selects `item`.
    ///
    /// Returns `true` if `item` left the union.
    pub fn remove(&mut self, participant: &P, item: &T) -> bool {
        let Some(own) = self.by_participant.get_mut(participant) else {
            return false;
        };
        if !own.remove(item) {
            return false;
        }
        if own.is_empty() {
            self.by_participant.remove(participant);
        }

        let Some(owners) = self.owners.get_mut(item) else {
            return false;
        };
        owners.retain(|p| p != participant);
        if owners.is_empty() {
            self.owners.remove(item);
            self.selection.remove(item)
        } else {
            false
        }
    }

    /// Replaces everything `participant` selects with `items`.
    ///
    /// Only the difference against the participant's previous selection is
    /// applied. Returns `true` if the union changed.
    pub fn set_participant_selection(
        &mut self,
        participant: P,
        items: impl IntoIterator<Item = T>,
    ) -> bool {
        let next: Selection<T> = items.into_iter().collect();
        let previous: Vec<T> = self
            .by_participant
            .get(&participant)
            .map(|s| s.items().to_vec())
            .unwrap_or_default();

        let mut changed = false;
        for item in previous.iter().filter(|item| !next.contains(*item)) {
            changed |= self.remove(&participant, item);
        }
        for item in next.iter().filter(|item| !previous.contains(*item)) {
            changed |= self.add(participant.clone(), item.clone());
        }
        changed
    }

    /// Drops every item `participant` selects.
    ///
    /// Returns `true` if the union changed.
    pub fn remove_participant(&mut self, participant: &P) -> bool {
        let Some(own) = self.by_participant.get(participant) else {
            return false;
        };
        let items: Vec<T> = own.items().to_vec();
        let mut changed = false;
        for item in &items {
            changed |= self.remove(participant, item);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_owner_does_not_change_union() {
        let mut union = SelectionUnion::<u8>::new();
        assert!(union.add(1, SelectionItem::Column(0)));
        assert!(!union.add(2, SelectionItem::Column(0)));
        assert!(!union.add(2, SelectionItem::Column(0)));

        assert_eq!(union.len(), 1);
        assert_eq!(union.owners(&SelectionItem::Column(0)), &[1, 2]);
        assert_eq!(union.revision(), 1);
    }

    #[test]
    fn removing_unowned_item_is_a_no_op() {
        let mut union = SelectionUnion::<u8>::new();
        union.add(1, SelectionItem::Row(0));

        assert!(!union.remove(&2, &SelectionItem::Row(0)));
        assert!(!union.remove(&1, &SelectionItem::Row(9)));
        assert!(union.contains(&SelectionItem::Row(0)));
    }

    #[test]
    fn empty_participants_are_forgotten() {
        let mut union = SelectionUnion::<u8>::new();
        union.add(1, SelectionItem::Row(0));
        union.remove(&1, &SelectionItem::Row(0));

        assert!(union.participant_selection(&1).is_none());
        assert!(union.owners(&SelectionItem::Row(0)).is_empty());
    }
}
