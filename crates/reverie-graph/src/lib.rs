// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Content-addressed reasoning DAG.
//!
//! The graph is append-only: nodes (reasoning artifacts) and typed
//! hyperedges (transitions from one or more inputs to exactly one output)
//! are created once, hashed at construction, verified on admission, and
//! never mutated or deleted. Every state-changing operation is
//! transactional at the call boundary — a rejected record leaves the graph
//! byte-identical to its pre-call state.
//!
//! # Invariants
//!
//! - DAG-001: the transitive closure of edges is acyclic; an edge that
//!   would close a cycle is rejected with [`DagError::CyclicEdge`].
//! - DAG-002: every id referenced by an edge or a node's parents exists at
//!   admission time and forever after.
//! - DAG-003: a record's stored hash always equals the recomputed hash of
//!   its canonical form.
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

mod dag;
mod edge;
mod error;
mod ident;
mod node;
mod observer;
mod payload;
mod shared;

pub use dag::{DagStats, ReasoningDag};
pub use edge::TransitionEdge;
pub use error::{DagError, IntegrityViolation};
pub use ident::{EdgeId, NodeId};
pub use node::ReasoningNode;
pub use observer::GraphObserver;
pub use payload::Payload;
pub use shared::SharedDag;
