// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subgraph extraction and detachability analysis.

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::graph::Dag;
use crate::key::{NodeIdentity, NodeKey};

impl<N> Dag<N>
where
    N: NodeIdentity + Clone,
{
    /// Builds a new graph containing `roots` and everything reachable from
    /// them through forward edges, with every edge encountered on the way.
    ///
    /// Roots that are not part of this graph are skipped. Since nodes only
    /// exist as edge endpoints, a root without children does not appear in
    /// the result. Zero roots yield an empty graph.
    ///
    /// # Example
    ///
    /// ```
    /// use choreo_dag::Dag;
    ///
    /// let mut dag = Dag::<u32>::new();
    /// dag.add_edge(1, 2);
    /// dag.add_edge(2, 3);
    /// dag.add_edge(4, 3);
    ///
    /// let sub = dag.extract_subgraph([&2]);
    /// assert!(sub.contains(&2) && sub.contains(&3));
    /// assert!(!sub.contains(&1) && !sub.contains(&4));
    /// assert_eq!(sub.edge_count(), 1);
    /// ```
    #[must_use]
    pub fn extract_subgraph<'n>(&self, roots: impl IntoIterator<Item = &'n N>) -> Self
    where
        N: 'n,
    {
        let keys: Vec<NodeKey> = roots.into_iter().map(NodeIdentity::node_key).collect();
        self.extract_subgraph_keys(&keys)
    }

    /// Key-based variant of [`extract_subgraph`](Self::extract_subgraph).
    #[must_use]
    pub fn extract_subgraph_keys(&self, roots: &[NodeKey]) -> Self {
        let mut out = Self::new();
        let mut visited: HashSet<&NodeKey> = HashSet::new();
        let mut stack: Vec<&NodeKey> = roots
            .iter()
            .filter(|key| self.contains_key(key))
            .collect();

        while let Some(key) = stack.pop() {
            if !visited.insert(key) {
                continue;
            }
            let Some(parent) = self.get(key) else {
                continue;
            };
            for child_key in self.child_keys(key) {
                if let Some(child) = self.get(child_key) {
                    out.add_edge(parent.clone(), child.clone());
                }
                stack.push(child_key);
            }
        }

        out
    }

    /// Builds a structural copy of the graph from its roots.
    ///
    /// The copy shares node values with `self` (for `Rc` nodes, the same
    /// objects) but has independent edge maps. For a valid graph this equals
    /// [`Clone::clone`]; for a graph with a cycle unreachable from any root,
    /// the nodes of that cycle are left out.
    #[must_use]
    pub fn clone_from_roots(&self) -> Self {
        let roots: Vec<NodeKey> = self.root_keys().cloned().collect();
        self.extract_subgraph_keys(&roots)
    }

    /// Returns `true` if `node` is the only entry point into the subgraph
    /// reachable from it.
    ///
    /// That is: every node reachable from `node` (other than `node` itself)
    /// has all of its parents inside that reachable subgraph. Runs one
    /// subgraph extraction plus one pass comparing parent counts.
    ///
    /// A node that is absent, or has no children, is trivially detachable.
    ///
    /// # Example
    ///
    /// ```
    /// use choreo_dag::Dag;
    ///
    /// let mut dag = Dag::<char>::new();
    /// for (p, c) in [('a', 'c'), ('b', 'c'), ('c', 'd'), ('c', 'e')] {
    ///     dag.add_edge(p, c);
    /// }
    /// assert!(dag.is_subgraph_detachable(&'c'));
    ///
    /// // `e` now has a parent outside of what `c` reaches.
    /// dag.add_edge('b', 'e');
    /// assert!(!dag.is_subgraph_detachable(&'c'));
    /// ```
    #[must_use]
    pub fn is_subgraph_detachable(&self, node: &N) -> bool {
        self.is_subgraph_detachable_key(&node.node_key())
    }

    /// Key-based variant of [`is_subgraph_detachable`](Self::is_subgraph_detachable).
    #[must_use]
    pub fn is_subgraph_detachable_key(&self, key: &NodeKey) -> bool {
        let sub = self.extract_subgraph_keys(core::slice::from_ref(key));
        sub.keys()
            .filter(|member| *member != key)
            .all(|member| sub.in_degree(member) == self.in_degree(member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sorted(mut values: Vec<u32>) -> Vec<u32> {
        values.sort_unstable();
        values
    }

    #[test]
    fn extract_follows_forward_edges_only() {
        let mut dag = Dag::<u32>::new();
        // 1 -> 2 -> 3 -> 4, 5 -> 3
        dag.add_edge(1, 2);
        dag.add_edge(2, 3);
        dag.add_edge(3, 4);
        dag.add_edge(5, 3);

        let sub = dag.extract_subgraph([&2]);
        assert_eq!(sorted(sub.values().copied().collect()), vec![2, 3, 4]);
        assert_eq!(sub.edge_count(), 2);
        assert!(!sub.contains_edge(&5, &3));
    }

    #[test]
    fn extract_from_multiple_roots_and_none() {
        let mut dag = Dag::<u32>::new();
        dag.add_edge(1, 2);
        dag.add_edge(3, 4);
        dag.add_edge(5, 6);

        let sub = dag.extract_subgraph([&1, &3]);
        assert_eq!(sorted(sub.values().copied().collect()), vec![1, 2, 3, 4]);

        let empty = dag.extract_subgraph(core::iter::empty());
        assert!(empty.is_empty());
    }

    #[test]
    fn extract_handles_shared_descendants_once() {
        let mut dag = Dag::<u32>::new();
        dag.add_edge(1, 2);
        dag.add_edge(1, 3);
        dag.add_edge(2, 4);
        dag.add_edge(3, 4);

        let sub = dag.extract_subgraph([&1]);
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.edge_count(), 4);
    }

    #[test]
    fn clone_from_roots_matches_clone_for_valid_graph() {
        let mut dag = Dag::<u32>::new();
        dag.add_edge(1, 2);
        dag.add_edge(2, 3);
        dag.add_edge(4, 3);

        let copy = dag.clone_from_roots();
        assert_eq!(copy.len(), dag.len());
        assert_eq!(copy.edge_count(), dag.edge_count());
        assert!(copy.contains_edge(&4, &3));
    }

    #[test]
    fn detachable_when_no_external_parents() {
        let mut dag = Dag::<u32>::new();
        // 1 -> 3, 2 -> 3, 3 -> 4, 3 -> 5
        dag.add_edge(1, 3);
        dag.add_edge(2, 3);
        dag.add_edge(3, 4);
        dag.add_edge(3, 5);
        assert!(dag.is_subgraph_detachable(&3));

        // 2 -> 5 gives 5 a parent outside the subgraph rooted at 3.
        dag.add_edge(2, 5);
        assert!(!dag.is_subgraph_detachable(&3));
        assert!(!dag.is_subgraph_detachable(&2));
    }

    #[test]
    fn internal_diamonds_stay_detachable() {
        let mut dag = Dag::<u32>::new();
        dag.add_edge(1, 2);
        dag.add_edge(1, 3);
        dag.add_edge(2, 4);
        dag.add_edge(3, 4);

        assert!(dag.is_subgraph_detachable(&1));
        assert!(!dag.is_subgraph_detachable(&2));
    }

    #[test]
    fn leaves_and_absent_nodes_are_trivially_detachable() {
        let mut dag = Dag::<u32>::new();
        dag.add_edge(1, 2);

        assert!(dag.is_subgraph_detachable(&2));
        assert!(dag.is_subgraph_detachable(&42));
    }
}
