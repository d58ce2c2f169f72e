// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for branches, epochs, and replay.

use thiserror::Error;

use reverie_codec::CodecError;
use reverie_graph::NodeId;

/// Errors surfaced by the snapshot/epoch subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EpochError {
    /// A caller-supplied argument failed validation before any state change.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Two branch logs with the same name were offered to one epoch.
    #[error("duplicate branch in epoch: {0}")]
    DuplicateBranch(String),

    /// Lookup miss for an epoch number.
    #[error("epoch not found: {0}")]
    EpochNotFound(u64),

    /// Replay target is not in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Replay target has producing edges but no path back to any root.
    ///
    /// Impossible for graphs built through the validating admission path;
    /// reachable only after a partial adapter restore.
    #[error("node {0} is unreachable from any root")]
    Unreachable(NodeId),

    /// A record could not be canonically encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
