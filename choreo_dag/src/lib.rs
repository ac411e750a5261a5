// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Choreo DAG: an identity-keyed directed acyclic graph.
//!
//! This crate provides the dependency graph used to wire dashboard
//! participants together ("this control affects that chart"). It models the
//! graph as:
//!
//! - **Node identity** ([`NodeKey`], [`NodeIdentity`]): shared objects are keyed
//!   by the identity of their allocation, primitives by a kind tag plus their
//!   string form. The graph never mutates the values it stores.
//! - **Edges** ([`Dag`]): parent → child edges kept in both directions, with at
//!   most one edge per ordered pair and no isolated nodes.
//! - **Ordering** ([`Dag::topological_sort`]): level-by-level peeling from the
//!   roots, failing with [`DagError::CycleDetected`] when a cycle exists
//!   anywhere in the graph.
//! - **Subgraphs** ([`Dag::extract_subgraph`], [`Dag::is_subgraph_detachable`]):
//!   everything reachable from a set of roots, and whether a node is the sole
//!   entry point into its reachable subgraph.
//!
//! ## Quick Start
//!
//! ```rust
//! use choreo_dag::Dag;
//!
//! let mut dag = Dag::<u32>::new();
//!
//! // 1 -> 2 -> 3
//! dag.add_edge(1, 2);
//! dag.add_edge(2, 3);
//!
//! assert!(dag.is_valid());
//! assert_eq!(dag.topological_sort().unwrap(), vec![1, 2, 3]);
//!
//! // Closing the loop is accepted by `add_edge`, but the graph is no longer valid.
//! dag.add_edge(3, 1);
//! assert!(!dag.is_valid());
//! ```
//!
//! ## Object identity
//!
//! Shared objects (`Rc<T>`, `Arc<T>`) are keyed by their allocation. The graph
//! stores a clone of each node value, which keeps the allocation alive and its
//! key unique for as long as the node is present.
//!
//! ```rust
//! use std::rc::Rc;
//! use choreo_dag::{Dag, NodeIdentity};
//!
//! let a = Rc::new("control");
//! let b = Rc::new("chart");
//!
//! let mut dag = Dag::new();
//! dag.add_edge(a.clone(), b.clone());
//!
//! assert!(dag.contains(&a));
//! assert_ne!(a.node_key(), b.node_key());
//! assert_eq!(a.node_key(), Rc::clone(&a).node_key());
//! ```
//!
//! ## Cycle Detection
//!
//! [`Dag::add_edge`] does not reject cycles. Callers that need an acyclic
//! graph add the edge, check [`Dag::is_valid`], and roll back with
//! [`Dag::remove_edge`] when the check fails.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod graph;
mod key;
mod sort;
mod subgraph;

pub use graph::{Dag, DagError, Descendants};
pub use key::{NodeIdentity, NodeKey, ObjectId};
