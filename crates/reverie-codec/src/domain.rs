// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Domain separators for content hashing.
//!
//! Every record kind hashes under its own prefix so byte-identical payloads
//! in different roles can never collide. The trailing `:v1` is the wire
//! format version tag; bumping an encoding means adding a `:v2` constant,
//! never editing an existing one.

/// Domain separator for reasoning node hashes.
pub const NODE_V1: &[u8] = b"reverie:node:v1";

/// Domain separator for transition edge hashes.
pub const EDGE_V1: &[u8] = b"reverie:edge:v1";

/// Domain separator for branch snapshot hashes.
pub const SNAPSHOT_V1: &[u8] = b"reverie:snapshot:v1";

/// Domain separator for epoch content hashes.
pub const EPOCH_V1: &[u8] = b"reverie:epoch:v1";
