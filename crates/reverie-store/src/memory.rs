// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory reference adapter.

use std::collections::BTreeMap;

use reverie_codec::{domain, hash_hex, verify_hash, Hash};
use reverie_epoch::BranchSnapshot;
use reverie_graph::{EdgeId, NodeId, ReasoningNode, TransitionEdge};

use crate::{StoreError, SubstrateStore};

/// `BTreeMap`-backed store.
///
/// Suitable for tests and single-process deployments. `BTreeMap` keys give
/// the ascending iteration order the port contract requires without any
/// extra sorting.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: BTreeMap<NodeId, ReasoningNode>,
    edges: BTreeMap<EdgeId, TransitionEdge>,
    snapshots: BTreeMap<Hash, BranchSnapshot>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}

impl SubstrateStore for MemoryStore {
    fn put_node(&mut self, node: &ReasoningNode) -> Result<(), StoreError> {
        if !verify_hash(node, domain::NODE_V1, &node.hash) {
            return Err(StoreError::IntegrityViolation {
                stored: node.hash_hex(),
                computed: hash_hex(&reverie_codec::compute_hash(node, domain::NODE_V1)),
            });
        }
        self.nodes.insert(node.id, node.clone());
        Ok(())
    }

    fn put_edge(&mut self, edge: &TransitionEdge) -> Result<(), StoreError> {
        if !verify_hash(edge, domain::EDGE_V1, &edge.hash) {
            return Err(StoreError::IntegrityViolation {
                stored: edge.hash_hex(),
                computed: hash_hex(&reverie_codec::compute_hash(edge, domain::EDGE_V1)),
            });
        }
        self.edges.insert(edge.id, edge.clone());
        Ok(())
    }

    fn put_snapshot(&mut self, snapshot: &BranchSnapshot) -> Result<(), StoreError> {
        if !reverie_epoch::verify(snapshot) {
            return Err(StoreError::IntegrityViolation {
                stored: snapshot.hash_hex(),
                computed: hash_hex(&reverie_codec::compute_hash(
                    snapshot,
                    domain::SNAPSHOT_V1,
                )),
            });
        }
        self.snapshots.insert(snapshot.hash, snapshot.clone());
        Ok(())
    }

    fn get_node(&self, id: NodeId) -> Option<ReasoningNode> {
        self.nodes.get(&id).cloned()
    }

    fn get_edge(&self, id: EdgeId) -> Option<TransitionEdge> {
        self.edges.get(&id).cloned()
    }

    fn get_snapshot(&self, hash: &Hash) -> Option<BranchSnapshot> {
        self.snapshots.get(hash).cloned()
    }

    fn iter_nodes(&self) -> Box<dyn Iterator<Item = &ReasoningNode> + '_> {
        Box::new(self.nodes.values())
    }

    fn iter_edges(&self) -> Box<dyn Iterator<Item = &TransitionEdge> + '_> {
        Box::new(self.edges.values())
    }

    fn iter_snapshots(&self) -> Box<dyn Iterator<Item = &BranchSnapshot> + '_> {
        Box::new(self.snapshots.values())
    }

    fn remove_snapshot(&mut self, hash: &Hash) -> bool {
        self.snapshots.remove(hash).is_some()
    }
}
