// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic replay over the reasoning DAG.
//!
//! Replay reconstructs how an artifact came to be: an ordered sequence of
//! transition edges from a root to the target node. The walk is reverse —
//! from the target back across producing edges — then flipped, with every
//! choice resolved by `created_at` ascending and id lexicographic so the
//! same graph always replays the same way.

use std::collections::BTreeSet;

use reverie_graph::{NodeId, ReasoningDag, TransitionEdge};

use crate::error::EpochError;

/// Read-only replay view over a graph.
///
/// Borrowing keeps replay a pure reader: under a [`SharedDag`] it runs on
/// the read side, concurrent with other queries.
///
/// [`SharedDag`]: reverie_graph::SharedDag
#[derive(Debug, Clone, Copy)]
pub struct ReplayEngine<'a> {
    dag: &'a ReasoningDag,
}

impl<'a> ReplayEngine<'a> {
    /// Creates a replay view over `dag`.
    #[must_use]
    pub fn new(dag: &'a ReasoningDag) -> Self {
        Self { dag }
    }

    /// Reconstructs a deterministic derivation path ending at `target`.
    ///
    /// The returned sequence satisfies: the last edge's output is
    /// `target`, each earlier edge's output feeds a later edge, and the
    /// first edge's inputs include a node with no producing edges (a
    /// root). A node that is itself a root replays as the empty path.
    ///
    /// # Errors
    ///
    /// - [`EpochError::NodeNotFound`] when `target` is not in the graph.
    /// - [`EpochError::Unreachable`] when the walk cannot terminate at a
    ///   root (possible only for graphs assembled from a damaged store).
    pub fn replay_path_to(&self, target: NodeId) -> Result<Vec<TransitionEdge>, EpochError> {
        if !self.dag.contains_node(target) {
            return Err(EpochError::NodeNotFound(target));
        }

        let mut path: Vec<TransitionEdge> = Vec::new();
        let mut visited: BTreeSet<NodeId> = BTreeSet::new();
        let mut current = target;

        loop {
            if !visited.insert(current) {
                return Err(EpochError::Unreachable(target));
            }
            let Some(edge) = self.producing_edge(current) else {
                break; // reached a node nothing produces: a root
            };
            path.push(edge.clone());
            current = Self::walk_input(self.dag, edge);
        }

        path.reverse();
        Ok(path)
    }

    /// Full deterministic topological order over the graph's nodes.
    #[must_use]
    pub fn replay_order(&self) -> Vec<NodeId> {
        self.dag.topological_order()
    }

    /// The deterministic choice among edges producing `node`: earliest
    /// `created_at`, then smallest id.
    fn producing_edge(&self, node: NodeId) -> Option<&TransitionEdge> {
        self.dag
            .edges_producing(node)
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
    }

    /// The deterministic input to continue the reverse walk from: earliest
    /// `created_at`, then smallest id, over the edge's input nodes.
    fn walk_input(dag: &ReasoningDag, edge: &TransitionEdge) -> NodeId {
        let mut best = edge.input_ids[0];
        for candidate in &edge.input_ids[1..] {
            let better = match (dag.get_node(*candidate), dag.get_node(best)) {
                (Ok(c), Ok(b)) => {
                    (c.created_at, c.id) < (b.created_at, b.id)
                }
                // Admission guarantees inputs exist; a damaged store falls
                // back to id order.
                _ => candidate < &best,
            };
            if better {
                best = *candidate;
            }
        }
        best
    }
}
