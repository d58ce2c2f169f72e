// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared, thread-safe handle over a [`ReasoningDag`].
//!
//! The graph itself is a plain single-owner structure; sharing is an
//! explicit choice made here, with a readers-writer lock: queries and
//! integrity verification take the read side, admissions take the write
//! side. One writer, many readers, no reader starvation games.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::dag::{DagStats, ReasoningDag};
use crate::edge::TransitionEdge;
use crate::error::{DagError, IntegrityViolation};
use crate::ident::{EdgeId, NodeId};
use crate::node::ReasoningNode;

/// Cloneable handle to a lock-guarded [`ReasoningDag`].
#[derive(Clone, Debug, Default)]
pub struct SharedDag {
    inner: Arc<RwLock<ReasoningDag>>,
}

impl SharedDag {
    /// Wraps an existing graph.
    #[must_use]
    pub fn new(dag: ReasoningDag) -> Self {
        Self {
            inner: Arc::new(RwLock::new(dag)),
        }
    }

    /// Runs a closure under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&ReasoningDag) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs a closure under the write lock.
    ///
    /// Observers registered on the graph fire while the lock is held;
    /// handlers that call back into this handle will deadlock, which is the
    /// documented non-reentrancy rule.
    pub fn write<R>(&self, f: impl FnOnce(&mut ReasoningDag) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Admits a node under the write lock.
    ///
    /// # Errors
    ///
    /// See [`ReasoningDag::add_node`].
    pub fn add_node(&self, node: ReasoningNode) -> Result<(), DagError> {
        self.inner.write().add_node(node)
    }

    /// Admits an edge under the write lock.
    ///
    /// # Errors
    ///
    /// See [`ReasoningDag::add_edge`].
    pub fn add_edge(&self, edge: TransitionEdge) -> Result<(), DagError> {
        self.inner.write().add_edge(edge)
    }

    /// Clones a node out under the read lock.
    ///
    /// # Errors
    ///
    /// [`DagError::NodeNotFound`] when absent.
    pub fn get_node(&self, id: NodeId) -> Result<ReasoningNode, DagError> {
        self.inner.read().get_node(id).cloned()
    }

    /// Clones an edge out under the read lock.
    ///
    /// # Errors
    ///
    /// [`DagError::EdgeNotFound`] when absent.
    pub fn get_edge(&self, id: EdgeId) -> Result<TransitionEdge, DagError> {
        self.inner.read().get_edge(id).cloned()
    }

    /// Node count under the read lock.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.read().node_count()
    }

    /// Edge count under the read lock.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.read().edge_count()
    }

    /// Aggregate counters under the read lock.
    #[must_use]
    pub fn stats(&self) -> DagStats {
        self.inner.read().stats()
    }

    /// Integrity verification under the read lock.
    ///
    /// # Errors
    ///
    /// See [`ReasoningDag::verify_integrity`].
    pub fn verify_integrity(&self) -> Result<(), Vec<IntegrityViolation>> {
        self.inner.read().verify_integrity()
    }
}
