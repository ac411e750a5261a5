// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

/// An ordered set of unique keys with a change counter.
///
/// Keys keep the order in which they were first added. Uniqueness is
/// enforced by equality, so `T` needs neither `Hash` nor `Ord`.
///
/// The [`revision`](Self::revision) counter bumps only when a mutation
/// changes the contents; no-op calls leave it unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection<T> {
    items: Vec<T>,
    revision: u64,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Selection<T> {
    /// Creates an empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            revision: 0,
        }
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of selected keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns the selected keys in insertion order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns an iterator over the selected keys.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns the current revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.bump_revision();
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl<T: PartialEq> Selection<T> {
    /// Returns `true` if `key` is selected.
    #[must_use]
    pub fn contains(&self, key: &T) -> bool {
        self.items.contains(key)
    }

    /// Adds `key`. Returns `true` if it was not already selected.
    pub fn add(&mut self, key: T) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.items.push(key);
        self.bump_revision();
        true
    }

    /// Removes `key`. Returns `true` if it was selected.
    pub fn remove(&mut self, key: &T) -> bool {
        let Some(idx) = self.items.iter().position(|k| k == key) else {
            return false;
        };
        self.items.remove(idx);
        self.bump_revision();
        true
    }

    /// Replaces the contents with `keys`, dropping duplicates.
    ///
    /// The revision bumps only if the resulting contents differ.
    pub fn replace_with(&mut self, keys: impl IntoIterator<Item = T>) {
        let mut new_items: Vec<T> = Vec::new();
        for key in keys {
            if !new_items.contains(&key) {
                new_items.push(key);
            }
        }
        if new_items == self.items {
            return;
        }
        self.items = new_items;
        self.bump_revision();
    }
}

impl<'a, T> IntoIterator for &'a Selection<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: PartialEq> FromIterator<T> for Selection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut selection = Self::new();
        selection.replace_with(iter);
        selection
    }
}
