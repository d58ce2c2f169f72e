// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for the reasoning DAG.

use thiserror::Error;

use reverie_codec::CodecError;

use crate::ident::{EdgeId, NodeId};

/// Errors surfaced by graph construction and mutation.
///
/// Every variant is non-fatal to the graph itself: a failed operation
/// leaves the store untouched and the caller decides whether to log,
/// retry, or refuse the submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DagError {
    /// A caller-supplied argument failed validation before any state change.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A node with this id is already present.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// An edge with this id is already present.
    #[error("duplicate edge id: {0}")]
    DuplicateEdge(EdgeId),

    /// A referenced node does not exist in the graph.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Admitting this edge would close a cycle.
    #[error("edge {0} would create a cycle")]
    CyclicEdge(EdgeId),

    /// Lookup miss for a node.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Lookup miss for an edge.
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// The record's stored hash does not match its recomputed canonical hash.
    #[error("integrity violation: stored hash {stored} != computed {computed}")]
    IntegrityViolation {
        /// Hash carried by the record, lowercase hex.
        stored: String,
        /// Hash recomputed from the canonical form, lowercase hex.
        computed: String,
    },

    /// The record could not be canonically encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A single defect found by [`ReasoningDag::verify_integrity`].
///
/// [`ReasoningDag::verify_integrity`]: crate::ReasoningDag::verify_integrity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum IntegrityViolation {
    /// A node's stored hash no longer matches its canonical form.
    #[error("node {id} hash mismatch")]
    NodeHashMismatch {
        /// The corrupted node.
        id: NodeId,
    },

    /// An edge's stored hash no longer matches its canonical form.
    #[error("edge {id} hash mismatch")]
    EdgeHashMismatch {
        /// The corrupted edge.
        id: EdgeId,
    },

    /// A node references a parent that is not in the graph.
    #[error("node {node} references missing parent {parent}")]
    MissingParent {
        /// The referencing node.
        node: NodeId,
        /// The absent parent.
        parent: NodeId,
    },

    /// An edge references an endpoint that is not in the graph.
    #[error("edge {edge} references missing node {node}")]
    MissingEndpoint {
        /// The referencing edge.
        edge: EdgeId,
        /// The absent endpoint.
        node: NodeId,
    },

    /// The edge relation is no longer acyclic.
    #[error("edge relation contains a cycle through {0} node(s)")]
    CycleDetected(usize),
}
