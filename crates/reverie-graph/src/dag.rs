// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory reasoning DAG store.
//!
//! Nodes and edges live in two flat `BTreeMap`s keyed by id; relationships
//! are expressed by id, never by pointer. Incremental adjacency indices
//! keep the cycle check linear in the reachable subgraph and the root/leaf
//! projections linear in the node count.
//!
//! # Determinism
//!
//! `BTreeMap` iteration gives every query a stable order. The topological
//! order breaks ties by `created_at` ascending, then id lexicographic, so
//! replay produces identical sequences across runs and processes.

use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use reverie_codec::{domain, hash_hex, short_hex, verify_hash};

use crate::edge::TransitionEdge;
use crate::error::{DagError, IntegrityViolation};
use crate::ident::{EdgeId, NodeId};
use crate::node::ReasoningNode;
use crate::observer::GraphObserver;

/// Aggregate counters over the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DagStats {
    /// Total admitted nodes.
    pub node_count: usize,
    /// Total admitted edges.
    pub edge_count: usize,
    /// Nodes with no parents and no incoming edges.
    pub root_count: usize,
    /// Nodes with no children and no outgoing edges.
    pub leaf_count: usize,
    /// Node tally per `type_name`.
    pub nodes_by_type: BTreeMap<String, usize>,
}

/// Append-only content-addressed event graph.
///
/// Not internally synchronized — wrap in [`SharedDag`] for the
/// readers-writer discipline when calling from multiple threads.
///
/// [`SharedDag`]: crate::SharedDag
#[derive(Default)]
pub struct ReasoningDag {
    /// All admitted nodes, keyed by id.
    nodes: BTreeMap<NodeId, ReasoningNode>,
    /// All admitted edges, keyed by id.
    edges: BTreeMap<EdgeId, TransitionEdge>,
    /// Edges leaving a node (node appears in `input_ids`).
    edges_out: BTreeMap<NodeId, Vec<EdgeId>>,
    /// Edges producing a node (node is `output_id`).
    edges_in: BTreeMap<NodeId, Vec<EdgeId>>,
    /// Times a node appears in another node's `parent_ids`.
    child_count: BTreeMap<NodeId, usize>,
    /// Synchronous subscribers, fired after successful mutations.
    observers: Vec<Arc<dyn GraphObserver>>,
}

impl std::fmt::Debug for ReasoningDag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningDag")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ReasoningDag {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a synchronous observer.
    ///
    /// Observers are invoked from inside the mutating call, after the
    /// mutation has been applied. Handlers must not call back into
    /// state-changing operations on the same instance.
    pub fn subscribe(&mut self, observer: Arc<dyn GraphObserver>) {
        self.observers.push(observer);
    }

    /// Admits a node.
    ///
    /// Transactional: any rejection leaves the graph untouched.
    ///
    /// # Errors
    ///
    /// - [`DagError::DuplicateNode`] if the id is already present.
    /// - [`DagError::UnknownNode`] if a parent is absent.
    /// - [`DagError::IntegrityViolation`] if the stored hash does not match
    ///   the canonical form.
    /// - [`DagError::InvalidArgument`] / [`DagError::Codec`] for records
    ///   that bypass the validating constructor via `from_parts`.
    pub fn add_node(&mut self, node: ReasoningNode) -> Result<(), DagError> {
        if node.type_name.is_empty() {
            return Err(DagError::InvalidArgument("node type_name must not be empty"));
        }
        node.payload.validate()?;
        if self.nodes.contains_key(&node.id) {
            return Err(DagError::DuplicateNode(node.id));
        }
        for parent in &node.parent_ids {
            if !self.nodes.contains_key(parent) {
                return Err(DagError::UnknownNode(*parent));
            }
        }
        if !verify_hash(&node, domain::NODE_V1, &node.hash) {
            return Err(DagError::IntegrityViolation {
                stored: node.hash_hex(),
                computed: hash_hex(&reverie_codec::compute_hash(&node, domain::NODE_V1)),
            });
        }

        for parent in &node.parent_ids {
            *self.child_count.entry(*parent).or_insert(0) += 1;
        }
        debug!(node = %node.id, hash = %short_hex(&node.hash), ty = %node.type_name, "node admitted");
        self.nodes.insert(node.id, node.clone());
        for observer in &self.observers {
            observer.on_node_added(&node);
        }
        Ok(())
    }

    /// Admits an edge.
    ///
    /// Transactional: any rejection, including the cycle check, leaves the
    /// graph untouched.
    ///
    /// # Errors
    ///
    /// - [`DagError::DuplicateEdge`] if the id is already present.
    /// - [`DagError::UnknownNode`] if any endpoint is absent.
    /// - [`DagError::CyclicEdge`] if admitting the edge would close a cycle.
    /// - [`DagError::IntegrityViolation`] on a hash mismatch.
    /// - [`DagError::InvalidArgument`] for records that bypass the
    ///   validating constructor via `from_parts`.
    pub fn add_edge(&mut self, edge: TransitionEdge) -> Result<(), DagError> {
        if edge.input_ids.is_empty() {
            return Err(DagError::InvalidArgument("edge input_ids must not be empty"));
        }
        if edge.operation_name.is_empty() {
            return Err(DagError::InvalidArgument(
                "edge operation_name must not be empty",
            ));
        }
        if let Some(c) = edge.confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(DagError::InvalidArgument(
                    "edge confidence must lie in [0.0, 1.0]",
                ));
            }
        }
        if self.edges.contains_key(&edge.id) {
            return Err(DagError::DuplicateEdge(edge.id));
        }
        for input in &edge.input_ids {
            if !self.nodes.contains_key(input) {
                return Err(DagError::UnknownNode(*input));
            }
        }
        if !self.nodes.contains_key(&edge.output_id) {
            return Err(DagError::UnknownNode(edge.output_id));
        }
        if !verify_hash(&edge, domain::EDGE_V1, &edge.hash) {
            return Err(DagError::IntegrityViolation {
                stored: edge.hash_hex(),
                computed: hash_hex(&reverie_codec::compute_hash(&edge, domain::EDGE_V1)),
            });
        }
        if self.would_cycle(&edge) {
            warn!(edge = %edge.id, op = %edge.operation_name, "edge rejected: would close a cycle");
            return Err(DagError::CyclicEdge(edge.id));
        }

        let unique_inputs: BTreeSet<NodeId> = edge.input_ids.iter().copied().collect();
        for input in unique_inputs {
            self.edges_out.entry(input).or_default().push(edge.id);
        }
        self.edges_in.entry(edge.output_id).or_default().push(edge.id);
        debug!(edge = %edge.id, hash = %short_hex(&edge.hash), op = %edge.operation_name, "edge admitted");
        self.edges.insert(edge.id, edge.clone());
        for observer in &self.observers {
            observer.on_edge_added(&edge);
        }
        Ok(())
    }

    /// Looks up a node.
    ///
    /// # Errors
    ///
    /// [`DagError::NodeNotFound`] when absent.
    pub fn get_node(&self, id: NodeId) -> Result<&ReasoningNode, DagError> {
        self.nodes.get(&id).ok_or(DagError::NodeNotFound(id))
    }

    /// Looks up an edge.
    ///
    /// # Errors
    ///
    /// [`DagError::EdgeNotFound`] when absent.
    pub fn get_edge(&self, id: EdgeId) -> Result<&TransitionEdge, DagError> {
        self.edges.get(&id).ok_or(DagError::EdgeNotFound(id))
    }

    /// `true` if a node with `id` has been admitted.
    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes whose `type_name` equals `type_name`, in id order.
    pub fn nodes_by_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a ReasoningNode> {
        self.nodes
            .values()
            .filter(move |n| n.type_name == type_name)
    }

    /// Nodes with no parents and no incoming edges, in id order.
    pub fn root_nodes(&self) -> impl Iterator<Item = &ReasoningNode> {
        self.nodes
            .values()
            .filter(|n| n.is_root() && !self.edges_in.contains_key(&n.id))
    }

    /// Nodes with no children and no outgoing edges, in id order.
    pub fn leaf_nodes(&self) -> impl Iterator<Item = &ReasoningNode> {
        self.nodes.values().filter(|n| {
            self.child_count.get(&n.id).copied().unwrap_or(0) == 0
                && !self.edges_out.contains_key(&n.id)
        })
    }

    /// Edges producing `id` (edges whose output is this node), in
    /// admission order.
    pub fn edges_producing(&self, id: NodeId) -> impl Iterator<Item = &TransitionEdge> {
        self.edges_in
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|eid| self.edges.get(eid))
    }

    /// Edges consuming `id` (edges whose inputs include this node), in
    /// admission order.
    pub fn edges_consuming(&self, id: NodeId) -> impl Iterator<Item = &TransitionEdge> {
        self.edges_out
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|eid| self.edges.get(eid))
    }

    /// Iterates all nodes in id order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &ReasoningNode> {
        self.nodes.values()
    }

    /// Iterates all edges in id order.
    pub fn iter_edges(&self) -> impl Iterator<Item = &TransitionEdge> {
        self.edges.values()
    }

    /// Total admitted nodes. O(1).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total admitted edges. O(1).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Aggregate counters, including a per-type node tally.
    #[must_use]
    pub fn stats(&self) -> DagStats {
        let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for node in self.nodes.values() {
            *nodes_by_type.entry(node.type_name.clone()).or_insert(0) += 1;
        }
        DagStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            root_count: self.root_nodes().count(),
            leaf_count: self.leaf_nodes().count(),
            nodes_by_type,
        }
    }

    /// Recomputes every stored hash and re-checks reference and acyclicity
    /// invariants.
    ///
    /// Read-only; safe to run concurrently with other readers.
    ///
    /// # Errors
    ///
    /// The full list of violations found, in deterministic order.
    pub fn verify_integrity(&self) -> Result<(), Vec<IntegrityViolation>> {
        let mut violations = Vec::new();

        for node in self.nodes.values() {
            if !verify_hash(node, domain::NODE_V1, &node.hash) {
                violations.push(IntegrityViolation::NodeHashMismatch { id: node.id });
            }
            for parent in &node.parent_ids {
                if !self.nodes.contains_key(parent) {
                    violations.push(IntegrityViolation::MissingParent {
                        node: node.id,
                        parent: *parent,
                    });
                }
            }
        }

        for edge in self.edges.values() {
            if !verify_hash(edge, domain::EDGE_V1, &edge.hash) {
                violations.push(IntegrityViolation::EdgeHashMismatch { id: edge.id });
            }
            for input in &edge.input_ids {
                if !self.nodes.contains_key(input) {
                    violations.push(IntegrityViolation::MissingEndpoint {
                        edge: edge.id,
                        node: *input,
                    });
                }
            }
            if !self.nodes.contains_key(&edge.output_id) {
                violations.push(IntegrityViolation::MissingEndpoint {
                    edge: edge.id,
                    node: edge.output_id,
                });
            }
        }

        let (order, _) = self.kahn_order();
        if order.len() < self.nodes.len() {
            violations.push(IntegrityViolation::CycleDetected(
                self.nodes.len() - order.len(),
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Deterministic topological order over all nodes.
    ///
    /// Kahn's algorithm over the edge-induced precedence (each edge makes
    /// every input precede the output); ties break by `created_at`
    /// ascending, then id lexicographic. Under the graph invariants the
    /// order always covers every node.
    #[must_use]
    pub fn topological_order(&self) -> Vec<NodeId> {
        self.kahn_order().0
    }

    /// Kahn sort returning `(order, leftover_indegrees)`; the leftover map
    /// is non-empty only when the edge relation contains a cycle.
    fn kahn_order(&self) -> (Vec<NodeId>, BTreeMap<NodeId, usize>) {
        // Dedupe (pred, succ) arcs: two edges between the same pair are one
        // precedence constraint.
        let mut arcs: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
        for edge in self.edges.values() {
            for input in &edge.input_ids {
                if *input != edge.output_id {
                    arcs.insert((*input, edge.output_id));
                }
            }
        }

        let mut indegree: BTreeMap<NodeId, usize> = BTreeMap::new();
        let mut succs: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for (pred, succ) in &arcs {
            *indegree.entry(*succ).or_insert(0) += 1;
            succs.entry(*pred).or_default().push(*succ);
        }

        // Min-heap over (created_at, id): BinaryHeap is a max-heap, so wrap
        // in Reverse.
        let mut ready: BinaryHeap<std::cmp::Reverse<(reverie_codec::Timestamp, NodeId)>> =
            BinaryHeap::new();
        for node in self.nodes.values() {
            if indegree.get(&node.id).copied().unwrap_or(0) == 0 {
                ready.push(std::cmp::Reverse((node.created_at, node.id)));
            }
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(std::cmp::Reverse((_, id))) = ready.pop() {
            order.push(id);
            for succ in succs.get(&id).into_iter().flatten() {
                if let Some(deg) = indegree.get_mut(succ) {
                    *deg -= 1;
                    if *deg == 0 {
                        if let Some(node) = self.nodes.get(succ) {
                            ready.push(std::cmp::Reverse((node.created_at, *succ)));
                        }
                    }
                }
            }
        }

        indegree.retain(|_, deg| *deg > 0);
        (order, indegree)
    }

    /// `true` when a path from `edge.output_id` already reaches any of the
    /// edge's inputs — admitting the edge would close a cycle.
    fn would_cycle(&self, edge: &TransitionEdge) -> bool {
        let targets: BTreeSet<NodeId> = edge.input_ids.iter().copied().collect();
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        visited.insert(edge.output_id);
        queue.push_back(edge.output_id);

        while let Some(current) = queue.pop_front() {
            if targets.contains(&current) {
                return true;
            }
            for out_edge in self.edges_consuming(current) {
                if visited.insert(out_edge.output_id) {
                    queue.push_back(out_edge.output_id);
                }
            }
        }
        false
    }
}
