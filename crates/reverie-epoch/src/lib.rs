// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Branch snapshots, retention, epoch projection, and deterministic replay.
//!
//! A branch is a named, append-only sequence of reasoning events. Capture
//! freezes a branch into an immutable, hash-verified [`BranchSnapshot`];
//! the [`EpochProjector`] folds one snapshot per branch into a numbered
//! [`Epoch`]; [`RetentionPolicy`] evaluation decides which snapshots to
//! keep — and only decides: deletion belongs to the collaborator executing
//! the returned [`RetentionPlan`].
//!
//! # Invariants
//!
//! - EPO-001: epoch numbers are contiguous from 1, strictly increasing,
//!   never reused.
//! - EPO-002: a failure while capturing any branch leaves the epoch log
//!   unchanged (all-or-nothing).
//! - EPO-003: replay output is a pure function of graph content — ties
//!   resolve by `created_at`, then id, never by map iteration accidents.
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

mod branch;
mod error;
mod projector;
mod replay;
mod retention;
mod snapshot;

pub use branch::{BranchEvent, BranchLog};
pub use error::EpochError;
pub use projector::{Epoch, EpochMetrics, EpochObserver, EpochProjector, SharedProjector};
pub use replay::ReplayEngine;
pub use retention::{RetentionPlan, RetentionPolicy};
pub use snapshot::{capture, verify, BranchSnapshot, Embedder};
