// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Level-by-level topological sort.

use alloc::vec::Vec;

use crate::graph::{Dag, DagError};
use crate::key::{NodeIdentity, NodeKey};

impl<N> Dag<N>
where
    N: NodeIdentity + Clone,
{
    /// Returns all nodes in dependency order: every parent before its children.
    ///
    /// Uses Kahn's algorithm, peeling the graph one level at a time:
    ///
    /// 1. The first level is the set of roots.
    /// 2. Each level is emitted, then its outgoing edges are removed from a
    ///    private copy of the backward edges.
    /// 3. Children left without parents form the next level.
    ///
    /// The live graph is never modified.
    ///
    /// The order among nodes of the same level depends on hash iteration order
    /// and is not guaranteed to be stable across runs or platforms. See
    /// [`topological_sort_deterministic`](Self::topological_sort_deterministic).
    ///
    /// # Errors
    ///
    /// Returns [`DagError::CycleDetected`] if some nodes could not be ordered,
    /// which happens exactly when a cycle exists anywhere in the graph.
    pub fn topological_sort(&self) -> Result<Vec<N>, DagError> {
        self.sort_keys(false).map(|keys| self.values_for(keys))
    }

    /// Deterministic variant of [`topological_sort`](Self::topological_sort).
    ///
    /// Nodes within the same level are yielded in ascending [`NodeKey`] order.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::CycleDetected`] if a cycle exists.
    pub fn topological_sort_deterministic(&self) -> Result<Vec<N>, DagError> {
        self.sort_keys(true).map(|keys| self.values_for(keys))
    }

    /// Returns the keys of all nodes in dependency order.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::CycleDetected`] if a cycle exists.
    pub fn topological_keys(&self) -> Result<Vec<NodeKey>, DagError> {
        self.sort_keys(false)
    }

    /// Returns `true` if the graph contains no cycle.
    ///
    /// Equivalent to `self.topological_sort().is_ok()`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.sort_keys(false).is_ok()
    }

    fn sort_keys(&self, deterministic: bool) -> Result<Vec<NodeKey>, DagError> {
        let total = self.len();
        let mut remaining_parents = self.backward_edges().clone();
        let mut sorted: Vec<NodeKey> = Vec::with_capacity(total);

        let mut level: Vec<NodeKey> = self.root_keys().cloned().collect();
        while !level.is_empty() {
            if deterministic {
                level.sort_unstable();
            }

            let mut next = Vec::new();
            for key in &level {
                for child in self.child_keys(key) {
                    let Some(parents) = remaining_parents.get_mut(child) else {
                        continue;
                    };
                    parents.remove(key);
                    if parents.is_empty() {
                        remaining_parents.remove(child);
                        next.push(child.clone());
                    }
                }
            }

            sorted.append(&mut level);
            level = next;
        }

        if sorted.len() != total {
            return Err(DagError::CycleDetected {
                sorted: sorted.len(),
                total,
            });
        }
        Ok(sorted)
    }

    fn values_for(&self, keys: Vec<NodeKey>) -> Vec<N> {
        keys.iter().filter_map(|key| self.value_of(key)).collect()
    }
}
