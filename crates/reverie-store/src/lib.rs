// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persistence port for the reasoning substrate.
//!
//! The core talks to storage only through [`SubstrateStore`]; an in-memory
//! adapter, a document store, and a vector store are all acceptable
//! implementations. [`MemoryStore`] is the reference adapter used by tests
//! and single-process deployments.
//!
//! # On-disk contract
//!
//! An adapter that persists records externally must store exactly the
//! canonical bytes defined by `reverie-codec` (obtainable via
//! `canonical_bytes`) so that hashes round-trip across processes. Field
//! order is fixed; versioning rides on the domain separator.
//!
//! # Absence semantics
//!
//! `get_*` returns `None` for missing records — absence is a lookup miss,
//! not an error. Error variants are reserved for integrity violations and
//! backend faults, which propagate unchanged; the core never retries.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod memory;

pub use memory::MemoryStore;

use thiserror::Error;

use reverie_codec::Hash;
use reverie_epoch::{BranchSnapshot, RetentionPlan};
use reverie_graph::{EdgeId, NodeId, ReasoningNode, TransitionEdge};

/// Errors at the persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The record's hash did not survive the trip to or from storage.
    #[error("integrity violation: stored hash {stored} != computed {computed}")]
    IntegrityViolation {
        /// Hash carried by the record, lowercase hex.
        stored: String,
        /// Hash recomputed from the canonical form, lowercase hex.
        computed: String,
    },

    /// Opaque backend fault, propagated unchanged from the adapter.
    #[error("storage adapter: {0}")]
    Adapter(String),
}

/// Abstract store for nodes, edges, and branch snapshots.
///
/// Implementations must re-verify record hashes on `put_*` so a corrupted
/// or tampered record is refused at the boundary rather than silently
/// persisted. Iteration yields records in ascending key order (node id,
/// edge id, snapshot hash) — adapters must not leak backend iteration
/// order.
pub trait SubstrateStore {
    /// Persists a node.
    ///
    /// # Errors
    ///
    /// [`StoreError::IntegrityViolation`] on hash mismatch;
    /// [`StoreError::Adapter`] for backend faults.
    fn put_node(&mut self, node: &ReasoningNode) -> Result<(), StoreError>;

    /// Persists an edge.
    ///
    /// # Errors
    ///
    /// [`StoreError::IntegrityViolation`] on hash mismatch;
    /// [`StoreError::Adapter`] for backend faults.
    fn put_edge(&mut self, edge: &TransitionEdge) -> Result<(), StoreError>;

    /// Persists a snapshot, keyed by its content hash.
    ///
    /// # Errors
    ///
    /// [`StoreError::IntegrityViolation`] on hash mismatch;
    /// [`StoreError::Adapter`] for backend faults.
    fn put_snapshot(&mut self, snapshot: &BranchSnapshot) -> Result<(), StoreError>;

    /// Retrieves a node. Absence is not an error.
    fn get_node(&self, id: NodeId) -> Option<ReasoningNode>;

    /// Retrieves an edge. Absence is not an error.
    fn get_edge(&self, id: EdgeId) -> Option<TransitionEdge>;

    /// Retrieves a snapshot by content hash. Absence is not an error.
    fn get_snapshot(&self, hash: &Hash) -> Option<BranchSnapshot>;

    /// Iterates stored nodes in ascending id order.
    fn iter_nodes(&self) -> Box<dyn Iterator<Item = &ReasoningNode> + '_>;

    /// Iterates stored edges in ascending id order.
    fn iter_edges(&self) -> Box<dyn Iterator<Item = &TransitionEdge> + '_>;

    /// Iterates stored snapshots in ascending hash order.
    fn iter_snapshots(&self) -> Box<dyn Iterator<Item = &BranchSnapshot> + '_>;

    /// Removes a snapshot. Returns `true` when something was removed.
    fn remove_snapshot(&mut self, hash: &Hash) -> bool;

    /// Executes a retention plan against the stored snapshots.
    ///
    /// Dry-run plans are a no-op. Returns the number of snapshots removed.
    /// This is the collaborator side of retention — policy evaluation
    /// itself never mutates storage.
    fn apply_retention(&mut self, plan: &RetentionPlan) -> usize {
        if plan.is_dry_run {
            return 0;
        }
        plan.to_delete
            .iter()
            .filter(|hash| self.remove_snapshot(hash))
            .count()
    }
}
