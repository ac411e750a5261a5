// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directed acyclic graph keyed by node identity.

use alloc::vec::Vec;
use core::fmt;

use hashbrown::{HashMap, HashSet};

use crate::key::{NodeIdentity, NodeKey};

/// Error returned by graph queries that require an acyclic graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DagError {
    /// The graph is non-empty but every node has an incoming edge.
    NoRoots,
    /// A cycle exists somewhere in the graph.
    CycleDetected {
        /// Number of nodes the sort managed to order before stalling.
        sorted: usize,
        /// Number of nodes in the graph.
        total: usize,
    },
}

impl fmt::Display for DagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRoots => write!(f, "graph is non-empty but has no roots"),
            Self::CycleDetected { sorted, total } => write!(
                f,
                "cycle detected: only {sorted} of {total} nodes could be ordered"
            ),
        }
    }
}

impl core::error::Error for DagError {}

/// Directed graph of parent → child edges between identity-keyed nodes.
///
/// `Dag` stores edges in both directions, allowing O(1) queries for both
/// "what are the children of A?" and "what are the parents of A?". Nodes only
/// exist as endpoints of edges: removing the last edge touching a node removes
/// the node too.
///
/// Acyclicity is not enforced on insertion. Use [`is_valid`](Self::is_valid)
/// or [`topological_sort`](Self::topological_sort) to check it.
///
/// Cloning a `Dag` clones the node values (for `Rc` nodes, the same objects)
/// into independent edge maps: mutating the clone never affects the original.
///
/// # Example
///
/// ```
/// use choreo_dag::Dag;
///
/// let mut dag = Dag::<&str>::new();
/// dag.add_edge("filter", "table");
/// dag.add_edge("filter", "chart");
///
/// assert_eq!(dag.len(), 3);
/// assert_eq!(dag.edge_count(), 2);
/// assert!(dag.is_root(&"filter"));
/// assert_eq!(dag.parents(&"chart"), Some(vec!["filter"]));
///
/// // Removing the only edge touching "chart" drops the node.
/// dag.remove_edge(&"filter", &"chart");
/// assert!(!dag.contains(&"chart"));
/// ```
#[derive(Clone)]
pub struct Dag<N> {
    /// Node values by key.
    nodes: HashMap<NodeKey, N>,
    /// Forward edges: parent -> children. Sets are never empty.
    forward: HashMap<NodeKey, HashSet<NodeKey>>,
    /// Backward edges: child -> parents. Always the transpose of `forward`.
    backward: HashMap<NodeKey, HashSet<NodeKey>>,
    edge_count: usize,
}

impl<N> Default for Dag<N> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            forward: HashMap::new(),
            backward: HashMap::new(),
            edge_count: 0,
        }
    }
}

impl<N> fmt::Debug for Dag<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dag")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("forward", &self.forward)
            .field("edge_count", &self.edge_count)
            .finish_non_exhaustive()
    }
}

impl<N> Dag<N> {
    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Removes all nodes and edges.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.forward.clear();
        self.backward.clear();
        self.edge_count = 0;
    }

    /// Returns an iterator over all node values.
    ///
    /// The iteration order is not specified and may vary across runs or platforms.
    pub fn values(&self) -> impl Iterator<Item = &N> + '_ {
        self.nodes.values()
    }

    /// Returns an iterator over all node keys.
    ///
    /// The iteration order is not specified and may vary across runs or platforms.
    pub fn keys(&self) -> impl Iterator<Item = &NodeKey> + '_ {
        self.nodes.keys()
    }

    /// Returns the node stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &NodeKey) -> Option<&N> {
        self.nodes.get(key)
    }

    /// Returns `true` if a node is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Returns `true` if the edge `parent -> child` exists, by key.
    #[must_use]
    pub fn contains_edge_key(&self, parent: &NodeKey, child: &NodeKey) -> bool {
        self.forward
            .get(parent)
            .is_some_and(|children| children.contains(child))
    }

    /// Returns `true` if the node stored under `key` has no incoming edges.
    ///
    /// Absent keys are not roots.
    #[must_use]
    pub fn is_root_key(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key) && !self.backward.contains_key(key)
    }

    /// Returns an iterator over the keys of the direct children of `key`.
    ///
    /// The iteration order is not specified and may vary across runs or platforms.
    pub fn child_keys(&self, key: &NodeKey) -> impl Iterator<Item = &NodeKey> + '_ {
        self.forward.get(key).into_iter().flatten()
    }

    /// Returns an iterator over the keys of the direct parents of `key`.
    ///
    /// The iteration order is not specified and may vary across runs or platforms.
    pub fn parent_keys(&self, key: &NodeKey) -> impl Iterator<Item = &NodeKey> + '_ {
        self.backward.get(key).into_iter().flatten()
    }

    /// Returns the number of parents of `key`.
    #[must_use]
    pub fn in_degree(&self, key: &NodeKey) -> usize {
        self.backward.get(key).map_or(0, HashSet::len)
    }

    /// Returns the number of children of `key`.
    #[must_use]
    pub fn out_degree(&self, key: &NodeKey) -> usize {
        self.forward.get(key).map_or(0, HashSet::len)
    }

    /// Returns an iterator over the keys of all nodes without incoming edges.
    ///
    /// Unlike [`roots`](Self::roots), this never fails; it simply yields
    /// nothing when every node has a parent.
    pub fn root_keys(&self) -> impl Iterator<Item = &NodeKey> + '_ {
        self.nodes
            .keys()
            .filter(|key| !self.backward.contains_key(*key))
    }

    /// Returns an iterator over all keys transitively reachable from `key`
    /// through forward edges, excluding `key` itself.
    ///
    /// This performs a DFS traversal. The iteration order is not specified and
    /// may vary across runs or platforms.
    pub fn descendant_keys<'a>(&'a self, key: &NodeKey) -> Descendants<'a, N> {
        Descendants::new(self, key)
    }

    /// Removes the edge `parent -> child`, by key.
    ///
    /// Endpoints left without any edge are removed from the graph.
    ///
    /// Returns `true` if the edge existed.
    pub fn remove_edge_key(&mut self, parent: &NodeKey, child: &NodeKey) -> bool {
        let Some(children) = self.forward.get_mut(parent) else {
            return false;
        };
        if !children.remove(child) {
            return false;
        }
        if children.is_empty() {
            self.forward.remove(parent);
        }

        if let Some(parents) = self.backward.get_mut(child) {
            parents.remove(parent);
            if parents.is_empty() {
                self.backward.remove(child);
            }
        }
        self.edge_count -= 1;

        self.remove_if_isolated(parent);
        self.remove_if_isolated(child);
        true
    }

    fn remove_if_isolated(&mut self, key: &NodeKey) {
        if !self.forward.contains_key(key) && !self.backward.contains_key(key) {
            self.nodes.remove(key);
        }
    }

    pub(crate) fn backward_edges(&self) -> &HashMap<NodeKey, HashSet<NodeKey>> {
        &self.backward
    }
}

impl<N> Dag<N>
where
    N: NodeIdentity + Clone,
{
    /// Creates a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the edge `parent -> child`.
    ///
    /// Both endpoints are inserted if missing. If a node with the same key is
    /// already present, the stored value is kept and the argument dropped.
    ///
    /// This does not check for cycles; see [`is_valid`](Self::is_valid).
    ///
    /// # Returns
    ///
    /// - `true` if the edge was newly added.
    /// - `false` if the edge already existed (nothing changes).
    pub fn add_edge(&mut self, parent: N, child: N) -> bool {
        let parent_key = parent.node_key();
        let child_key = child.node_key();
        if self.contains_edge_key(&parent_key, &child_key) {
            return false;
        }

        self.nodes.entry(parent_key.clone()).or_insert(parent);
        self.nodes.entry(child_key.clone()).or_insert(child);
        self.forward
            .entry(parent_key.clone())
            .or_default()
            .insert(child_key.clone());
        self.backward.entry(child_key).or_default().insert(parent_key);
        self.edge_count += 1;
        true
    }

    /// Removes the edge `parent -> child`.
    ///
    /// If either endpoint is left without any edge, it is removed from the
    /// graph as well.
    ///
    /// Returns `true` if the edge existed and was removed.
    pub fn remove_edge(&mut self, parent: &N, child: &N) -> bool {
        self.remove_edge_key(&parent.node_key(), &child.node_key())
    }

    /// Returns `true` if `node` is part of the graph.
    #[must_use]
    pub fn contains(&self, node: &N) -> bool {
        self.contains_key(&node.node_key())
    }

    /// Returns `true` if the edge `parent -> child` exists.
    #[must_use]
    pub fn contains_edge(&self, parent: &N, child: &N) -> bool {
        self.contains_edge_key(&parent.node_key(), &child.node_key())
    }

    /// Returns `true` if `node` is present and has no incoming edges.
    #[must_use]
    pub fn is_root(&self, node: &N) -> bool {
        self.is_root_key(&node.node_key())
    }

    /// Returns the parents of `node`.
    ///
    /// Returns `None` if `node` is absent or has no parents.
    #[must_use]
    pub fn parents(&self, node: &N) -> Option<Vec<N>> {
        self.collect_values(self.backward.get(&node.node_key()))
    }

    /// Returns the children of `node`.
    ///
    /// Returns `None` if `node` is absent or has no children.
    #[must_use]
    pub fn children(&self, node: &N) -> Option<Vec<N>> {
        self.collect_values(self.forward.get(&node.node_key()))
    }

    /// Returns all nodes without incoming edges.
    ///
    /// An empty graph has no roots and returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::NoRoots`] if the graph is non-empty but every node
    /// has a parent. Cycles that leave at least one root are not detected
    /// here; use [`topological_sort`](Self::topological_sort) for that.
    pub fn roots(&self) -> Result<Vec<N>, DagError> {
        let roots: Vec<N> = self
            .root_keys()
            .filter_map(|key| self.nodes.get(key).cloned())
            .collect();
        if roots.is_empty() && !self.is_empty() {
            return Err(DagError::NoRoots);
        }
        Ok(roots)
    }

    /// Returns an iterator over all nodes transitively reachable from `node`,
    /// excluding `node` itself.
    ///
    /// The iteration order is not specified and may vary across runs or platforms.
    pub fn descendants(&self, node: &N) -> impl Iterator<Item = &N> + '_ {
        let key = node.node_key();
        Descendants::new(self, &key).filter_map(|k| self.nodes.get(k))
    }

    pub(crate) fn value_of(&self, key: &NodeKey) -> Option<N> {
        self.nodes.get(key).cloned()
    }

    fn collect_values(&self, keys: Option<&HashSet<NodeKey>>) -> Option<Vec<N>> {
        let keys = keys?;
        let values: Vec<N> = keys
            .iter()
            .filter_map(|key| self.nodes.get(key).cloned())
            .collect();
        (!values.is_empty()).then_some(values)
    }
}

/// Iterator over transitive descendants using DFS.
///
/// Created by [`Dag::descendant_keys`].
pub struct Descendants<'a, N> {
    graph: &'a Dag<N>,
    visited: HashSet<&'a NodeKey>,
    stack: Vec<&'a NodeKey>,
}

impl<N> fmt::Debug for Descendants<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descendants")
            .field("visited", &self.visited.len())
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

impl<'a, N> Descendants<'a, N> {
    fn new(graph: &'a Dag<N>, start: &NodeKey) -> Self {
        let mut iter = Self {
            graph,
            visited: HashSet::new(),
            stack: Vec::new(),
        };
        iter.stack.extend(graph.child_keys(start));
        iter
    }
}

impl<'a, N> Iterator for Descendants<'a, N> {
    type Item = &'a NodeKey;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(key) = self.stack.pop() {
            if self.visited.insert(key) {
                self.stack.extend(self.graph.child_keys(key));
                return Some(key);
            }
        }
        None
    }
}
