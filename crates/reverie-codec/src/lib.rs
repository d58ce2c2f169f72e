// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical byte encoding and content hashing for Reverie.
//!
//! Every content-addressed record in the substrate (reasoning node,
//! transition edge, branch snapshot, epoch) hashes the same way: a
//! hand-rolled, length-prefixed canonical byte form fed to BLAKE3 under a
//! record-kind domain separator. Serde never sits on this path — canonical
//! bytes are the wire format, and the wire format is the hash preimage.
//!
//! # Determinism contract
//!
//! - Field order within a record is fixed by its [`Canonical`] impl.
//! - Variable-length fields carry a `u64` little-endian length prefix.
//! - Maps are encoded as a count followed by `(key, value)` pairs in
//!   ascending key order; sequences preserve caller order.
//! - Floating-point values are encoded as IEEE-754 bit patterns, never as
//!   text.
//! - Each domain separator embeds a version tag; an absent tag means
//!   version 1.
//!
//! Changing any of these is a wire-format break and must come with a new
//! domain constant.
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

mod canonical;
pub mod domain;
mod time;

pub use canonical::{
    canonical_bytes, check_field_len, compute_hash, verify_hash, Canonical, CanonicalEncoder,
    CodecError, MAX_FIELD_LEN,
};
pub use time::{Clock, SystemClock, Timestamp};

#[cfg(any(test, feature = "testing"))]
pub use time::ManualClock;

/// Canonical 256-bit content hash used throughout the substrate.
pub type Hash = [u8; 32];

/// Renders a hash as lowercase hex (the external form required for
/// content-addressed records).
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Renders the first 8 bytes of a hash as lowercase hex for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[0..8])
}

/// Parses a 64-character lowercase hex string back into a [`Hash`].
///
/// Returns `None` for wrong lengths or non-hex characters.
pub fn parse_hash_hex(s: &str) -> Option<Hash> {
    if s.len() != 64 {
        return None;
    }
    let bytes = hex::decode(s).ok()?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Some(hash)
}
